//! 前端页面
//!
//! 页面与脚本在编译时嵌入二进制，由同一进程提供，前端只与 `/api/get-idea` 通信。

use axum::{
    http::header,
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use std::sync::Arc;

use crate::state::AppState;

const INDEX_HTML: &str = include_str!("../../static/index.html");
const APP_JS: &str = include_str!("../../static/app.js");

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn app_js() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/javascript; charset=utf-8")],
        APP_JS,
    )
}

/// 创建页面路由
pub fn page_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .route("/app.js", get(app_js))
}
