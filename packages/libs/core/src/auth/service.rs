//! 토큰 발급/갱신 서비스
//!
//! [`TokenMaker`]와 [`SessionStore`]를 묶어 로그인 시 토큰 발급, Access Token 갱신,
//! Access Token 검증을 제공합니다.
//!
//! # 갱신 흐름
//!
//! ```text
//! Start → VerifyRefreshToken → LookupSession → ValidateSession → IssueAccessToken → Done
//! ```
//!
//! 어느 단계에서든 거부로 끝날 수 있으며, 세션은 읽기만 합니다.
//! Refresh Token은 회전하지 않습니다.

use chrono::{Duration, Utc};

use super::maker::TokenMaker;
use super::payload::Payload;
use crate::context::CallContext;
use crate::error::{Error, ErrorKind, Result};
use crate::session::{ClientMetadata, CreateSessionParams, Session, SessionStore, StoreError};

/// 토큰 수명 설정
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenServiceConfig {
    pub access_token_duration: Duration,
    pub refresh_token_duration: Duration,
}

impl Default for TokenServiceConfig {
    fn default() -> Self {
        Self {
            access_token_duration: Duration::minutes(15),
            refresh_token_duration: Duration::hours(24),
        }
    }
}

/// Access + Refresh Token 쌍
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access_token: String,
    pub access_payload: Payload,
    pub refresh_token: String,
    pub refresh_payload: Payload,
}

/// 로그인 결과
#[derive(Debug, Clone)]
pub struct LoginTokens {
    pub session: Session,
    pub tokens: IssuedTokens,
}

/// 토큰 서비스
pub struct TokenService<S> {
    maker: TokenMaker,
    store: S,
    config: TokenServiceConfig,
}

impl<S: SessionStore> TokenService<S> {
    /// 새 서비스
    pub fn new(maker: TokenMaker, store: S, config: TokenServiceConfig) -> Self {
        Self {
            maker,
            store,
            config,
        }
    }

    pub fn maker(&self) -> &TokenMaker {
        &self.maker
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &TokenServiceConfig {
        &self.config
    }

    /// Access Token과 Refresh Token 발급
    pub fn create_access_and_refresh_tokens(
        &self,
        subject: &str,
        access_duration: Duration,
        refresh_duration: Duration,
    ) -> Result<IssuedTokens> {
        let (access_token, access_payload) = self.maker.create_token(subject, access_duration)?;
        let (refresh_token, refresh_payload) = self.maker.create_token(subject, refresh_duration)?;

        Ok(IssuedTokens {
            access_token,
            access_payload,
            refresh_token,
            refresh_payload,
        })
    }

    /// 로그인: 토큰 발급 후 Refresh Token에 묶인 세션 생성
    ///
    /// 자격 증명 확인은 호출자의 몫입니다.
    pub async fn open_session(
        &self,
        ctx: &CallContext,
        subject: &str,
        metadata: ClientMetadata,
    ) -> Result<LoginTokens> {
        let tokens = self.create_access_and_refresh_tokens(
            subject,
            self.config.access_token_duration,
            self.config.refresh_token_duration,
        )?;

        let params = CreateSessionParams::for_refresh_token(
            tokens.refresh_token.clone(),
            &tokens.refresh_payload,
            metadata,
        );

        let session = ctx
            .run(self.store.create_session(params))
            .await?
            .map_err(|e| {
                tracing::error!("Failed to create session: {}", e);
                Error::internal(format!("error creating session: {}", e))
            })?;

        tracing::info!(session_id = %session.id, "Session opened");
        Ok(LoginTokens { session, tokens })
    }

    /// Access Token 검증
    pub fn verify_access_token(&self, token: &str) -> Result<Payload> {
        self.maker.verify_token(token)
    }

    /// Refresh Token으로 새 Access Token 발급
    pub async fn renew_access_token(
        &self,
        ctx: &CallContext,
        refresh_token: &str,
    ) -> Result<(String, Payload)> {
        // VerifyRefreshToken
        let refresh_payload = self.maker.verify_token(refresh_token).map_err(|e| {
            match &e {
                Error::InvalidToken { reason } => {
                    tracing::warn!(reason = %reason, "Refresh token rejected");
                }
                other => tracing::warn!(reason = %other, "Refresh token rejected"),
            }
            match e.kind() {
                ErrorKind::Unauthenticated => Error::Unauthenticated,
                _ => e,
            }
        })?;

        // LookupSession
        let session = ctx
            .run(self.store.get_session(&refresh_payload.id))
            .await?
            .map_err(|e| match e {
                StoreError::NotFound => {
                    tracing::debug!(session_id = %refresh_payload.id, "Session not found");
                    Error::SessionNotFound
                }
                StoreError::Backend(message) => {
                    tracing::error!(session_id = %refresh_payload.id, "Session lookup failed: {}", message);
                    Error::internal(message)
                }
            })?;

        // ValidateSession
        if let Err(rejection) = session.validate(&refresh_payload, refresh_token, Utc::now()) {
            tracing::warn!(session_id = %session.id, reason = %rejection, "Session rejected");
            return Err(Error::Unauthenticated);
        }

        // IssueAccessToken
        let (access_token, access_payload) = self
            .maker
            .create_token(&session.subject, self.config.access_token_duration)
            .map_err(|e| {
                tracing::error!(session_id = %session.id, "Failed to create access token: {}", e);
                Error::internal(format!("error creating access token: {}", e))
            })?;

        tracing::debug!(session_id = %session.id, token_id = %access_payload.id, "Access token renewed");
        Ok((access_token, access_payload))
    }
}
