//! authd 미들웨어
//!
//! 요청 ID 부여, 요청 출처 추출, Bearer 토큰 인증을 정의합니다.

use std::sync::Arc;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use psg_core::auth::Payload;
use psg_core::session::ClientMetadata;
use uuid::Uuid;

use crate::error::AuthdError;
use crate::state::AppState;

const AUTHORIZATION_TYPE: &str = "bearer";
const REQUEST_ID_HEADER: &str = "x-request-id";
const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

tokio::task_local! {
    static REQUEST_ID: String;
}

/// 현재 요청의 ID (에러 응답에 실립니다)
pub fn current_request_id() -> Option<String> {
    REQUEST_ID.try_with(|id| id.clone()).ok()
}

/// 요청 ID 부여
///
/// 클라이언트가 보낸 `x-request-id`가 있으면 이어 쓰고, 없으면 새로 만듭니다.
pub async fn request_id(req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let mut resp = REQUEST_ID.scope(id.clone(), next.run(req)).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        resp.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    resp
}

/// 요청 출처 (User-Agent, 클라이언트 IP)
///
/// 프록시 뒤에 있으므로 IP는 `x-forwarded-for`의 첫 항목을 씁니다.
#[derive(Clone, Debug)]
pub struct RequestMetadata(pub ClientMetadata);

impl<S: Send + Sync> FromRequestParts<S> for RequestMetadata {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(RequestMetadata(client_metadata(&parts.headers)))
    }
}

pub fn client_metadata(headers: &HeaderMap) -> ClientMetadata {
    let header_str = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    ClientMetadata {
        user_agent: header_str(header::USER_AGENT.as_str())
            .unwrap_or_default()
            .to_string(),
        client_ip: header_str(FORWARDED_FOR_HEADER)
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .unwrap_or_default()
            .to_string(),
    }
}

/// 인증된 요청의 토큰 Payload
///
/// [`require_auth`]가 request extension에 넣고, 핸들러는 extractor로 꺼냅니다.
#[derive(Clone, Debug)]
pub struct AuthPayload(pub Payload);

impl<S: Send + Sync> FromRequestParts<S> for AuthPayload {
    type Rejection = AuthdError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthPayload>()
            .cloned()
            .ok_or_else(|| AuthdError::Unauthorized {
                message: "missing authenticated payload".to_string(),
            })
    }
}

/// `Authorization: Bearer <token>` 헤더에서 토큰 추출
pub fn bearer_token(value: &str) -> Result<&str, AuthdError> {
    let mut fields = value.split_whitespace();
    let (Some(kind), Some(token)) = (fields.next(), fields.next()) else {
        return Err(AuthdError::Unauthorized {
            message: "invalid authorization header format".to_string(),
        });
    };

    if !kind.eq_ignore_ascii_case(AUTHORIZATION_TYPE) {
        return Err(AuthdError::Unauthorized {
            message: format!("unsupported authorization type {}", kind.to_ascii_lowercase()),
        });
    }

    Ok(token)
}

/// Access Token 검증 미들웨어
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthdError> {
    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AuthdError::Unauthorized {
            message: "missing authorization header".to_string(),
        })?;

    let token = bearer_token(value)?;
    let payload = state.tokens.verify_access_token(token)?;

    req.extensions_mut().insert(AuthPayload(payload));
    Ok(next.run(req).await)
}
