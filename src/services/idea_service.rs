//! Idea 生成服务
//!
//! 封装 GeminiClient，与配置系统集成：校验 category、构建 prompt、调用上游并规范化结果

use std::time::{Duration, Instant};
use tracing::{info, warn};

use super::prompt_service::{PromptService, FALLBACK_IDEA};
use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::llm::{GeminiClient, LlmError};
use crate::utils::request_logger::RequestLogger;

/// Idea 服务
pub struct IdeaService {
    client: Option<GeminiClient>,
    prompts: PromptService,
    max_category_chars: usize,
    timeout_secs: u64,
    request_logger: Option<RequestLogger>,
}

impl IdeaService {
    /// 根据配置创建服务
    ///
    /// 未设置密钥时不创建客户端，之后每个请求都返回配置错误。
    pub fn new(config: &AppConfig) -> Result<Self, LlmError> {
        let client = if config.api_key_set() {
            Some(GeminiClient::new(
                config.api_key.clone(),
                &config.base_url,
                &config.model,
                Duration::from_secs(config.timeout_secs),
            )?)
        } else {
            warn!("GEMINI_API_KEY is not set; idea requests will fail until it is configured");
            None
        };

        Ok(Self {
            client,
            prompts: PromptService::new(),
            max_category_chars: config.max_category_chars,
            timeout_secs: config.timeout_secs,
            request_logger: config.request_log_dir.clone().map(RequestLogger::new),
        })
    }

    /// 是否已配置 API 密钥
    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    /// 检查密钥，在解析请求体之前调用
    pub fn ensure_configured(&self) -> AppResult<()> {
        if self.is_configured() {
            Ok(())
        } else {
            Err(AppError::MisconfiguredServer)
        }
    }

    /// 校验 category 长度
    pub fn check_category(&self, category: &str) -> AppResult<()> {
        if self.max_category_chars > 0 && category.chars().count() > self.max_category_chars {
            return Err(AppError::BadRequestBody(format!(
                "Category must be at most {} characters.",
                self.max_category_chars
            )));
        }
        Ok(())
    }

    /// 生成 idea，单次上游调用，不重试、不缓存
    pub async fn generate_idea(&self, request_id: &str, category: &str) -> AppResult<String> {
        let client = self.client.as_ref().ok_or(AppError::MisconfiguredServer)?;
        self.check_category(category)?;

        let request = self.prompts.build_request(category);
        let start_time = Instant::now();
        let entry = self.request_logger.as_ref().map(|logger| {
            logger.log_request(
                request_id,
                client.endpoint(),
                client.model(),
                category,
                &self.prompts.build_idea_prompt(category),
                self.timeout_secs,
                client.api_key(),
            )
        });

        match client.generate_content(&request).await {
            Ok(response) => {
                let idea = match response.first_text() {
                    Some(text) => PromptService::normalize_idea(text),
                    None => {
                        warn!("Gemini response had no candidate text, using fallback idea");
                        FALLBACK_IDEA.to_string()
                    }
                };
                info!(
                    "Successfully generated idea in {} ms",
                    start_time.elapsed().as_millis()
                );

                if let (Some(logger), Some(entry)) = (&self.request_logger, entry) {
                    logger.log_success(entry, start_time, &idea);
                }
                Ok(idea)
            }
            Err(err) => {
                if let (Some(logger), Some(entry)) = (&self.request_logger, entry) {
                    let status_code = match &err {
                        LlmError::ApiError { status, .. } => Some(*status),
                        _ => None,
                    };
                    logger.log_error(
                        entry,
                        start_time,
                        error_kind(&err),
                        &err.to_string(),
                        status_code,
                    );
                }
                Err(err.into())
            }
        }
    }
}

/// 错误类型名，写入 JSONL 日志
fn error_kind(err: &LlmError) -> &'static str {
    match err {
        LlmError::HttpError(_) => "upstream_unreachable",
        LlmError::Timeout => "upstream_timeout",
        LlmError::ApiError { .. } => "upstream_error",
        LlmError::JsonError(_) => "upstream_invalid_response",
        LlmError::ConfigError(_) => "misconfigured",
    }
}
