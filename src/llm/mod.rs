//! LLM 模块
//!
//! 提供 Gemini `generateContent` 客户端及其载荷类型。

mod client;
mod format;
mod types;

pub use client::GeminiClient;
pub use format::{build_generate_content_endpoint, fix_base_url, normalize_model};
pub use types::*;
