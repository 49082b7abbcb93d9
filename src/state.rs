//! 应用状态管理
//!
//! 定义在请求处理器之间共享的只读状态。请求之间没有可变共享数据。

use std::sync::Arc;

use crate::config::AppConfig;
use crate::llm::LlmError;
use crate::services::IdeaService;

/// 应用共享状态
///
/// 使用 Arc 包裹以便在多个处理器之间安全共享
pub struct AppState {
    /// 启动时加载的配置
    pub config: Arc<AppConfig>,
    /// Idea 生成服务
    pub ideas: IdeaService,
}

impl AppState {
    /// 创建新的应用状态
    pub fn new(config: AppConfig) -> Result<Self, LlmError> {
        let ideas = IdeaService::new(&config)?;
        Ok(Self {
            config: Arc::new(config),
            ideas,
        })
    }
}

/// 创建可共享的应用状态
pub fn create_shared_state(config: AppConfig) -> Result<Arc<AppState>, LlmError> {
    Ok(Arc::new(AppState::new(config)?))
}
