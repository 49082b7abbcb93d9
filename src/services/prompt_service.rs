//! Prompt 构建服务
//!
//! 负责把 category 嵌入固定模板，并规范化上游返回的 idea 文本

use once_cell::sync::Lazy;
use regex::Regex;

use crate::llm::GenerateContentRequest;

/// 上游未返回文本时的默认 idea
pub const FALLBACK_IDEA: &str = "Could not generate an idea. Please try again.";

/// 首尾双引号，两端各自独立匹配
static RE_SURROUNDING_QUOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^"|"$"#).unwrap());

/// Prompt 服务
pub struct PromptService;

impl PromptService {
    /// 创建新的 Prompt 服务
    pub fn new() -> Self {
        Self
    }

    /// 构建 idea prompt，category 原样替换，不做转义
    pub fn build_idea_prompt(&self, category: &str) -> String {
        format!(
            "Generate a single, innovative, and concise project idea within the '{}' category. \
             The idea should be actionable for a small team.",
            category
        )
    }

    /// 构建上游请求载荷
    pub fn build_request(&self, category: &str) -> GenerateContentRequest {
        GenerateContentRequest::from_prompt(self.build_idea_prompt(category))
    }

    /// 规范化 idea 文本
    ///
    /// 去掉首尾空白后，分别去掉一个开头和一个结尾的双引号，不要求成对。
    pub fn normalize_idea(text: &str) -> String {
        RE_SURROUNDING_QUOTE
            .replace_all(text.trim(), "")
            .into_owned()
    }
}

impl Default for PromptService {
    fn default() -> Self {
        Self::new()
    }
}
