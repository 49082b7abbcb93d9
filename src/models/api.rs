//! REST API 请求/响应模型

use serde::{Deserialize, Serialize};

/// 获取 idea 的请求
///
/// `category` 缺失或为 `null` 时视为空字符串。
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdeaRequest {
    #[serde(default)]
    pub category: Option<String>,
}

impl IdeaRequest {
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
        }
    }

    /// 用于 prompt 替换的 category 文本
    pub fn category(&self) -> &str {
        self.category.as_deref().unwrap_or_default()
    }
}

/// 获取 idea 的成功响应
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdeaResponse {
    pub idea: String,
}

/// 错误响应
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub message: String,
}
