//! 공통 에러 타입
//!
//! Passage 전체에서 사용되는 에러 타입을 정의합니다.
//! 호출자는 에러를 식별자 비교가 아니라 [`ErrorKind`]로 구분합니다.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Passage 공통 에러
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    // ─────────────────────────────────────────────────────────────────────────────
    // Token Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("crypto error: {message}")]
    Crypto { message: String },

    /// 형식 오류, 위조, 키 불일치를 구분하지 않습니다.
    /// `reason`은 내부 로깅용이며 Display에 포함되지 않습니다.
    #[error("invalid token")]
    InvalidToken { reason: String },

    #[error("token expired")]
    TokenExpired,

    // ─────────────────────────────────────────────────────────────────────────────
    // Session Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("unauthenticated")]
    Unauthenticated,

    #[error("session not found")]
    SessionNotFound,

    #[error("internal error: {message}")]
    Internal { message: String },

    // ─────────────────────────────────────────────────────────────────────────────
    // Cancellation
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("request cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// 에러 분류
///
/// 외부로 노출되는 거친 카테고리입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    InvalidArgument,
    Unauthenticated,
    NotFound,
    Cancelled,
    Internal,
}

impl Error {
    /// 에러 분류
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Configuration { .. } => ErrorKind::Configuration,
            Error::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Error::InvalidToken { .. } | Error::TokenExpired | Error::Unauthenticated => {
                ErrorKind::Unauthenticated
            }
            Error::SessionNotFound => ErrorKind::NotFound,
            Error::Cancelled | Error::DeadlineExceeded => ErrorKind::Cancelled,
            Error::Crypto { .. } | Error::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// HTTP 상태 코드로 변환
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            // 400 Bad Request
            ErrorKind::InvalidArgument => 400,

            // 401 Unauthorized
            ErrorKind::Unauthenticated => 401,

            // 404 Not Found
            ErrorKind::NotFound => 404,

            // 499 Client Closed Request
            ErrorKind::Cancelled => 499,

            // 500 Internal Server Error
            ErrorKind::Configuration | ErrorKind::Internal => 500,
        }
    }

    /// 에러 코드 (클라이언트용)
    ///
    /// 인증 실패는 원인과 관계없이 하나의 코드로 합쳐집니다.
    pub fn code(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Configuration => "CONFIGURATION_ERROR",
            ErrorKind::InvalidArgument => "INVALID_ARGUMENT",
            ErrorKind::Unauthenticated => "UNAUTHENTICATED",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Cancelled => "CANCELLED",
            ErrorKind::Internal => "INTERNAL_ERROR",
        }
    }

    /// 클라이언트에 노출해도 되는 메시지
    pub fn public_message(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Configuration | ErrorKind::Internal => "internal server error",
            ErrorKind::InvalidArgument => "invalid request",
            ErrorKind::Unauthenticated => "authentication failed",
            ErrorKind::NotFound => "session not found",
            ErrorKind::Cancelled => "request cancelled",
        }
    }

    pub(crate) fn invalid_token(reason: impl Into<String>) -> Self {
        Error::InvalidToken {
            reason: reason.into(),
        }
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
        }
    }
}
