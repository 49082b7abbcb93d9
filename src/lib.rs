//! Project Idea Generator - Gemini 代理后端
//!
//! 对浏览器隐藏 Gemini API 密钥：接收 category，构建 prompt，调用 `generateContent`，
//! 把结果规范化为 `{idea}` 或 `{message}`。

use axum::response::{IntoResponse, Response};
use axum::Router;
use std::any::Any as PanicPayload;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::error;

pub mod api;
pub mod config;
pub mod error;
pub mod llm;
pub mod models;
pub mod requester;
pub mod services;
pub mod state;
pub mod utils;

use api::create_api_routes;
use error::AppError;
use state::AppState;

/// 构建完整应用：路由 + panic 兜底 + CORS + 请求追踪
pub fn create_app(state: Arc<AppState>) -> Router {
    with_layers(Router::new().merge(create_api_routes(state)))
}

fn with_layers(router: Router) -> Router {
    // 配置 CORS（允许所有来源）
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// 处理器 panic 时返回 `{message}`，细节只写日志
fn handle_panic(payload: Box<dyn PanicPayload + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    error!("Handler panicked: {}", detail);

    AppError::Internal(detail).into_response()
}
