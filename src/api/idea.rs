//! Idea 生成端点
//!
//! `POST /api/get-idea`：检查方法 → 检查密钥 → 解析请求体 → 调用上游 → 返回 `{idea}` 或 `{message}`。

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::Method,
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, info_span, warn, Instrument};

use crate::error::{AppError, AppResult};
use crate::models::{IdeaRequest, IdeaResponse};
use crate::state::AppState;
use crate::utils::request_logger::RequestLogger;

/// 请求体上限
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// 获取 idea
///
/// 请求体读取失败（如超过上限）也在密钥检查之后才报告。
async fn get_idea(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> AppResult<Json<IdeaResponse>> {
    let request_id = RequestLogger::generate_request_id();
    let span = info_span!("get_idea", request_id = %request_id);

    async move {
        info!("Idea request received");

        // 密钥检查必须在解析请求体和调用上游之前
        if let Err(e) = state.ideas.ensure_configured() {
            error!("GEMINI_API_KEY is not set, rejecting request");
            return Err(e);
        }

        let body = body.map_err(|rejection| {
            warn!("Failed to read request body: {}", rejection.body_text());
            AppError::BadRequestBody(format!("Invalid request body: {}", rejection.body_text()))
        })?;
        let request = parse_idea_request(&body)?;
        let category = request.category();
        info!("Received request for category: {}", category);

        let idea = state.ideas.generate_idea(&request_id, category).await?;
        Ok::<_, AppError>(Json(IdeaResponse { idea }))
    }
    .instrument(span)
    .await
}

/// 非 POST 请求
async fn method_not_allowed(method: Method) -> AppError {
    warn!("Rejected {} /api/get-idea: method not allowed", method);
    AppError::MethodNotAllowed
}

/// 解析请求体
///
/// 必须是 JSON 对象；不校验 Content-Type。
fn parse_idea_request(body: &[u8]) -> AppResult<IdeaRequest> {
    let value: Value = serde_json::from_slice(body).map_err(|e| {
        warn!("Failed to parse request body: {}", e);
        AppError::BadRequestBody(format!("Invalid request body: {}", e))
    })?;

    if !value.is_object() {
        warn!("Request body is not a JSON object");
        return Err(AppError::BadRequestBody(
            "Invalid request body: expected a JSON object".to_string(),
        ));
    }

    IdeaRequest::deserialize(value).map_err(|e| {
        warn!("Invalid request body: {}", e);
        AppError::BadRequestBody(format!("Invalid request body: {}", e))
    })
}

/// 创建 idea 路由
pub fn idea_routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/api/get-idea",
        post(get_idea)
            .fallback(method_not_allowed)
            .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
    )
}
