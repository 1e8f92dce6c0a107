//! 세션 저장소 인터페이스
//!
//! 코어가 요구하는 최소 계약입니다. 실제 영속화는 서비스 쪽에서 구현합니다.

use async_trait::async_trait;

use super::model::{CreateSessionParams, Session};
use crate::id::TokenId;

/// 저장소 에러
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("session not found")]
    NotFound,

    #[error("session store error: {0}")]
    Backend(String),
}

/// 세션 저장소
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// 세션 생성 (로그인 흐름에서 호출)
    async fn create_session(&self, params: CreateSessionParams) -> Result<Session, StoreError>;

    /// ID로 세션 조회
    async fn get_session(&self, id: &TokenId) -> Result<Session, StoreError>;
}

#[async_trait]
impl<S: SessionStore + ?Sized> SessionStore for std::sync::Arc<S> {
    async fn create_session(&self, params: CreateSessionParams) -> Result<Session, StoreError> {
        (**self).create_session(params).await
    }

    async fn get_session(&self, id: &TokenId) -> Result<Session, StoreError> {
        (**self).get_session(id).await
    }
}
