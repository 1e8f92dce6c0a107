use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};

use psg_core::id::TokenId;
use psg_core::session::{CreateSessionParams, Session, SessionStore, StoreError};

/// SQLite 세션 저장소
#[derive(Clone)]
pub struct SqliteSessionStore {
    pool: SqlitePool,
}

impl SqliteSessionStore {
    pub async fn connect(db_url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(db_url)?.create_if_missing(true);
        let mut pool_options = SqlitePoolOptions::new().max_connections(5);
        if db_url.contains(":memory:") {
            // 메모리 DB는 연결마다 별개이므로 연결 하나를 계속 유지합니다.
            pool_options = pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }
        let pool = pool_options.connect_with(options).await?;

        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    async fn init(&self) -> anyhow::Result<()> {
        let queries = [
            r#"CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                subject TEXT NOT NULL,
                refresh_token TEXT NOT NULL,
                user_agent TEXT NOT NULL,
                client_ip TEXT NOT NULL,
                is_blocked INTEGER NOT NULL DEFAULT 0,
                expires_at TEXT NOT NULL,
                created_at TEXT NOT NULL
            );"#,
            r#"CREATE INDEX IF NOT EXISTS idx_sessions_subject ON sessions (subject);"#,
        ];

        for q in queries {
            sqlx::query(q).execute(&self.pool).await?;
        }

        Ok(())
    }

    /// 세션 차단 (폐기)
    pub async fn block_session(&self, id: &TokenId) -> Result<(), StoreError> {
        let result = sqlx::query(r#"UPDATE sessions SET is_blocked = 1 WHERE id = ?1"#)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn create_session(&self, params: CreateSessionParams) -> Result<Session, StoreError> {
        let session = params.into_session(Utc::now());
        sqlx::query(
            r#"INSERT INTO sessions (id, subject, refresh_token, user_agent, client_ip, is_blocked, expires_at, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"#,
        )
        .bind(session.id.to_string())
        .bind(&session.subject)
        .bind(&session.refresh_token)
        .bind(&session.user_agent)
        .bind(&session.client_ip)
        .bind(session.is_blocked)
        .bind(session.expires_at.to_rfc3339())
        .bind(session.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(session)
    }

    async fn get_session(&self, id: &TokenId) -> Result<Session, StoreError> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"SELECT id, subject, refresh_token, user_agent, client_ip, is_blocked, expires_at, created_at
               FROM sessions WHERE id = ?1"#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.ok_or(StoreError::NotFound)?.into_session()
    }
}

#[derive(Debug, Clone)]
pub struct SessionRow {
    pub id: String,
    pub subject: String,
    pub refresh_token: String,
    pub user_agent: String,
    pub client_ip: String,
    pub is_blocked: bool,
    pub expires_at: String,
    pub created_at: String,
}

impl<'r> sqlx::FromRow<'r, SqliteRow> for SessionRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            subject: row.try_get("subject")?,
            refresh_token: row.try_get("refresh_token")?,
            user_agent: row.try_get("user_agent")?,
            client_ip: row.try_get("client_ip")?,
            is_blocked: row.try_get::<i64, _>("is_blocked")? != 0,
            expires_at: row.try_get("expires_at")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl SessionRow {
    pub fn into_session(self) -> Result<Session, StoreError> {
        Ok(Session {
            id: self
                .id
                .parse()
                .map_err(|e: psg_core::Error| StoreError::Backend(e.to_string()))?,
            subject: self.subject,
            refresh_token: self.refresh_token,
            user_agent: self.user_agent,
            client_ip: self.client_ip,
            is_blocked: self.is_blocked,
            expires_at: parse_timestamp(&self.expires_at)?,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Backend(format!("invalid timestamp '{}': {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use psg_core::auth::Payload;
    use psg_core::session::ClientMetadata;

    async fn store() -> SqliteSessionStore {
        SqliteSessionStore::connect("sqlite::memory:").await.unwrap()
    }

    fn params() -> CreateSessionParams {
        let payload = Payload::new("alice@example.com", Duration::hours(1), Utc::now()).unwrap();
        CreateSessionParams::for_refresh_token(
            "v4.local.refresh",
            &payload,
            ClientMetadata {
                user_agent: "Mozilla/5.0".to_string(),
                client_ip: "192.168.0.10".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn test_create_and_get_session() {
        let store = store().await;
        let params = params();
        let id = params.id;

        let created = store.create_session(params).await.unwrap();
        let fetched = store.get_session(&id).await.unwrap();

        assert_eq!(fetched, created);
        assert_eq!(fetched.client_ip, "192.168.0.10");
        assert!(!fetched.is_blocked);
    }

    #[tokio::test]
    async fn test_get_missing_session() {
        let store = store().await;
        let err = store.get_session(&TokenId::new()).await.unwrap_err();
        assert_eq!(err, StoreError::NotFound);
    }

    #[tokio::test]
    async fn test_duplicate_session_is_backend_error() {
        let store = store().await;
        let params = params();

        store.create_session(params.clone()).await.unwrap();
        let err = store.create_session(params).await.unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
    }

    #[tokio::test]
    async fn test_block_session() {
        let store = store().await;
        let params = params();
        let id = params.id;
        store.create_session(params).await.unwrap();

        store.block_session(&id).await.unwrap();
        assert!(store.get_session(&id).await.unwrap().is_blocked);

        let err = store.block_session(&TokenId::new()).await.unwrap_err();
        assert_eq!(err, StoreError::NotFound);
    }
}
