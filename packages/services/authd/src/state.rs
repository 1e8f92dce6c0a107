//! authd 앱 상태

use std::time::Duration;

use psg_core::auth::{TokenMaker, TokenService};
use psg_core::CallContext;

use crate::config::Config;
use crate::db::SqliteSessionStore;

/// 앱 상태
///
/// 모든 핸들러에서 공유하는 상태입니다.
pub struct AppState {
    /// 설정
    pub config: Config,

    /// 토큰 발급/갱신 서비스
    pub tokens: TokenService<SqliteSessionStore>,
}

impl AppState {
    /// 새 상태 생성
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let maker = TokenMaker::from_key_material(&config.token_symmetric_key)?;
        let store = SqliteSessionStore::connect(&config.db_url).await?;

        Ok(Self {
            config: config.clone(),
            tokens: TokenService::new(maker, store, config.token_service()?),
        })
    }

    /// 요청 하나의 저장소 호출 컨텍스트
    pub fn call_context(&self) -> CallContext {
        CallContext::background().with_timeout(Duration::from_millis(self.config.store_timeout_ms))
    }

    /// 세션 저장소
    pub fn sessions(&self) -> &SqliteSessionStore {
        self.tokens.store()
    }
}
