//! Gemini 请求/响应类型定义

use serde::{Deserialize, Serialize};

/// 消息内容，请求与响应共用
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Content {
    /// 角色：user, model
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub role: Option<String>,
    /// 内容片段
    #[serde(default)]
    pub parts: Option<Vec<Part>>,
}

impl Content {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts: Some(vec![Part {
                text: Some(text.into()),
            }]),
        }
    }
}

/// 文本片段
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub text: Option<String>,
}

/// `generateContent` 请求载荷
#[derive(Debug, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

impl GenerateContentRequest {
    /// 单条用户消息
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self {
            contents: vec![Content::user(prompt)],
        }
    }
}

/// `generateContent` 响应
///
/// 所有层级都可能缺失，缺失时由调用方回退；类型不符则视为无效响应。
#[derive(Debug, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

impl GenerateContentResponse {
    /// 取 `candidates[0].content.parts[0].text`
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .as_ref()?
            .first()?
            .content
            .as_ref()?
            .parts
            .as_ref()?
            .first()?
            .text
            .as_deref()
    }
}

/// LLM 错误类型
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// HTTP 请求错误（已去除包含密钥的 URL）
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// API 返回错误
    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    /// 超时错误
    #[error("request timed out")]
    Timeout,

    /// 配置错误
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// JSON 解析错误
    #[error("JSON parse failed: {0}")]
    JsonError(#[from] serde_json::Error),
}
