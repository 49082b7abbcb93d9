//! 统一错误处理模块
//!
//! 定义应用级错误类型，并实现 axum 的 IntoResponse trait 以便自动转换为 HTTP 响应。
//! 所有错误在处理器边界被转换为 `{"message": ...}`，上游响应体与密钥只写入服务端日志。

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::llm::LlmError;
use crate::models::ErrorResponse;

/// 应用错误枚举
#[derive(Error, Debug)]
pub enum AppError {
    /// 请求方法不是 POST
    #[error("Method Not Allowed")]
    MethodNotAllowed,

    /// 服务端未配置 API 密钥
    #[error("API key is not set on the server.")]
    MisconfiguredServer,

    /// 请求体无法解析或不符合约束
    #[error("{0}")]
    BadRequestBody(String),

    /// 上游返回非 2xx 状态码
    #[error("The AI service returned an error. Check server logs.")]
    UpstreamError { status: u16 },

    /// 上游返回 2xx 但响应体无法解析
    #[error("Received an invalid response from the AI service.")]
    UpstreamInvalidResponse,

    /// 无法连接上游（DNS、TLS、连接重置、超时）
    #[error("An internal server error occurred while contacting the AI.")]
    UpstreamUnreachable,

    /// 内部错误
    #[error("An internal server error occurred.")]
    Internal(String),
}

impl AppError {
    /// 对应的 HTTP 状态码
    ///
    /// 上游错误统一返回 500，不透传上游状态码。
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::BadRequestBody(_) => StatusCode::BAD_REQUEST,
            AppError::MisconfiguredServer
            | AppError::UpstreamError { .. }
            | AppError::UpstreamInvalidResponse
            | AppError::UpstreamUnreachable
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::HttpError(_) | LlmError::Timeout => AppError::UpstreamUnreachable,
            LlmError::ApiError { status, .. } => AppError::UpstreamError { status },
            LlmError::JsonError(_) => AppError::UpstreamInvalidResponse,
            LlmError::ConfigError(_) => AppError::MisconfiguredServer,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse {
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}

/// 便捷类型别名
pub type AppResult<T> = Result<T, AppError>;
