//! authd 에러 타입

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// authd 에러
#[derive(Debug, thiserror::Error)]
pub enum AuthdError {
    #[error("bad request: {message}")]
    BadRequest { message: String },

    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("session store error: {0}")]
    Store(#[from] psg_core::session::StoreError),

    #[error("core error: {0}")]
    Core(#[from] psg_core::Error),
}

/// 에러 응답 JSON
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(rename = "requestId", skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl IntoResponse for AuthdError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AuthdError::BadRequest { message } => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", message.clone())
            }
            AuthdError::Unauthorized { message } => {
                tracing::debug!("Unauthorized: {}", message);
                (
                    StatusCode::UNAUTHORIZED,
                    "UNAUTHENTICATED",
                    "authentication failed".to_string(),
                )
            }
            AuthdError::Store(psg_core::session::StoreError::NotFound) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "session not found".to_string(),
            ),
            AuthdError::Store(e) => {
                tracing::error!("Session store error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "internal server error".to_string(),
                )
            }
            AuthdError::Core(e) => {
                // 상세 원인은 로그에만 남깁니다.
                match e.kind() {
                    psg_core::ErrorKind::Internal | psg_core::ErrorKind::Configuration => {
                        tracing::error!("Core error: {:?}", e)
                    }
                    _ => tracing::debug!("Core error: {:?}", e),
                }
                let status = StatusCode::from_u16(e.status_code())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                (status, e.code(), e.public_message().to_string())
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                request_id: crate::middleware::current_request_id(),
            },
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AuthdError>;
