//! 토큰 핸들러
//!
//! Refresh Token으로 Access Token 갱신, 세션 폐기, 현재 주체 조회를 처리합니다.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use psg_core::auth::Payload;
use psg_core::session::SessionStore;

use crate::error::{AuthdError, Result};
use crate::middleware::{AuthPayload, RequestMetadata};
use crate::state::AppState;

/// Refresh Token 요청 본문
#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    #[serde(default)]
    pub refresh_token: String,
}

impl RefreshTokenRequest {
    fn token(&self) -> Result<&str> {
        let token = self.refresh_token.trim();
        if token.is_empty() {
            return Err(AuthdError::BadRequest {
                message: "refresh_token is required".to_string(),
            });
        }
        Ok(token)
    }
}

/// 갱신 응답 본문
#[derive(Debug, Serialize, Deserialize)]
pub struct RenewAccessTokenResponse {
    pub access_token: String,
    pub access_token_expires_at: DateTime<Utc>,
}

/// POST /tokens/renew
pub async fn renew_access_token(
    State(state): State<Arc<AppState>>,
    RequestMetadata(client): RequestMetadata,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<Json<RenewAccessTokenResponse>> {
    let token = request.token()?;
    let (access_token, payload) = state
        .tokens
        .renew_access_token(&state.call_context(), token)
        .await?;

    tracing::info!(
        token_id = %payload.id,
        user_agent = %client.user_agent,
        client_ip = %client.client_ip,
        "Access token renewed"
    );

    Ok(Json(RenewAccessTokenResponse {
        access_token,
        access_token_expires_at: payload.expired_at,
    }))
}

/// POST /tokens/revoke
///
/// 제출된 Refresh Token에 묶인 세션을 차단합니다.
pub async fn revoke_session(
    State(state): State<Arc<AppState>>,
    RequestMetadata(client): RequestMetadata,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<StatusCode> {
    let token = request.token()?;
    let payload = state
        .tokens
        .maker()
        .verify_token(token)
        .map_err(|e| AuthdError::Unauthorized {
            message: format!("refresh token rejected: {:?}", e),
        })?;

    let session = state
        .call_context()
        .run(state.sessions().get_session(&payload.id))
        .await??;

    if session.subject != payload.subject || session.refresh_token != token {
        return Err(AuthdError::Unauthorized {
            message: format!("refresh token does not own session {}", session.id),
        });
    }

    state.sessions().block_session(&session.id).await?;
    tracing::info!(
        session_id = %session.id,
        user_agent = %client.user_agent,
        client_ip = %client.client_ip,
        "Session revoked"
    );
    Ok(StatusCode::NO_CONTENT)
}

/// GET /tokens/me
pub async fn current_payload(AuthPayload(payload): AuthPayload) -> Json<Payload> {
    Json(payload)
}
