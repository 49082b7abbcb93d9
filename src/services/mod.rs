//! 服务层模块

mod idea_service;
mod prompt_service;

pub use idea_service::IdeaService;
pub use prompt_service::{PromptService, FALLBACK_IDEA};
