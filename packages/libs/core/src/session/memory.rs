//! 메모리 세션 저장소
//!
//! 테스트와 단일 프로세스 임베딩용입니다.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use super::model::{CreateSessionParams, Session};
use super::store::{SessionStore, StoreError};
use crate::id::TokenId;

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<TokenId, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 세션 차단 (폐기 경로)
    pub fn block_session(&self, id: &TokenId) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        let session = sessions.get_mut(id).ok_or(StoreError::NotFound)?;
        session.is_blocked = true;
        Ok(())
    }

    /// 저장된 세션 수
    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> StoreError {
    StoreError::Backend("session map lock poisoned".to_string())
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create_session(&self, params: CreateSessionParams) -> Result<Session, StoreError> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        if sessions.contains_key(&params.id) {
            return Err(StoreError::Backend(format!("session {} already exists", params.id)));
        }

        let session = params.into_session(Utc::now());
        sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn get_session(&self, id: &TokenId) -> Result<Session, StoreError> {
        let sessions = self.sessions.read().map_err(poisoned)?;
        sessions.get(id).cloned().ok_or(StoreError::NotFound)
    }
}
