//! Gemini REST 客户端

use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error, info};

use super::format::{build_generate_content_endpoint, normalize_model};
use super::types::{GenerateContentRequest, GenerateContentResponse, LlmError};
use crate::utils::request_logger::truncate;

/// 日志中上游响应体的最大长度
const MAX_LOGGED_BODY: usize = 2000;

/// Gemini `generateContent` 客户端
///
/// 密钥以 `key` 查询参数传递，reqwest 错误里的 URL 会带上它，
/// 所以所有错误在记录或返回前都调用 `without_url`。
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl GeminiClient {
    /// 创建新的 Gemini 客户端
    pub fn new(
        api_key: impl Into<String>,
        base_url: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(LlmError::ConfigError("API Key is required".to_string()));
        }

        // 构建 HTTP 客户端
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| LlmError::HttpError(e.without_url()))?;

        Ok(Self {
            client,
            api_key,
            model: normalize_model(model),
            endpoint: build_generate_content_endpoint(base_url, model),
        })
    }

    /// 模型 ID（不含 `models/` 前缀）
    pub fn model(&self) -> &str {
        &self.model
    }

    /// 端点 URL（不含密钥）
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub(crate) fn api_key(&self) -> &str {
        &self.api_key
    }

    /// 调用 `generateContent`，单次请求，不重试
    pub async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, LlmError> {
        debug!("Gemini API request: endpoint={}, model={}", self.endpoint, self.model);

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            error!("Gemini API error - status: {}", status.as_u16());
            error!("Gemini API error - body: {}", truncate(&body, MAX_LOGGED_BODY));
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        info!("Gemini API responded: status={}", status.as_u16());

        serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse Gemini response: {}", e);
            error!(
                "Received non-JSON response from Gemini API: {}",
                truncate(&body, MAX_LOGGED_BODY)
            );
            LlmError::JsonError(e)
        })
    }
}

/// 传输层错误：去掉 URL，区分超时
fn transport_error(err: reqwest::Error) -> LlmError {
    let err = err.without_url();
    if err.is_timeout() {
        error!("Gemini request timed out: {}", err);
        LlmError::Timeout
    } else {
        error!("Gemini request error: {}", err);
        LlmError::HttpError(err)
    }
}
