//! 配置查看端点
//!
//! 配置在启动时读取后只读，这里只提供脱敏后的查看接口。

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::state::AppState;

/// 配置响应（隐藏 api_key 的实际值）
#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    /// 是否已设置 API 密钥
    pub api_key_set: bool,
    /// API 基础 URL
    pub base_url: String,
    /// 模型名称
    pub model: String,
    /// 上游超时（秒）
    pub timeout_secs: u64,
    /// category 最大字符数
    pub max_category_chars: usize,
}

impl From<&AppConfig> for ConfigResponse {
    fn from(config: &AppConfig) -> Self {
        Self {
            api_key_set: config.api_key_set(),
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            timeout_secs: config.timeout_secs,
            max_category_chars: config.max_category_chars,
        }
    }
}

/// 获取当前配置
async fn get_config_handler(State(state): State<Arc<AppState>>) -> Json<ConfigResponse> {
    Json(ConfigResponse::from(state.config.as_ref()))
}

/// 创建配置路由
pub fn config_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/config", get(get_config_handler))
}
