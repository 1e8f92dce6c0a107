//! 세션 모델

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::Payload;
use crate::id::TokenId;

/// 세션
///
/// 저장소가 소유하며, 코어는 조회된 사본만 다룹니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Session ID (= Refresh Token payload ID)
    pub id: TokenId,

    /// 세션 소유 주체
    pub subject: String,

    /// 발급된 Refresh Token 원문
    pub refresh_token: String,

    pub user_agent: String,

    pub client_ip: String,

    /// 차단 여부 (폐기 시 설정)
    pub is_blocked: bool,

    /// 만료 시각
    pub expires_at: DateTime<Utc>,

    /// 생성 시각
    pub created_at: DateTime<Utc>,
}

/// 세션 거부 사유
///
/// 내부 로깅용입니다. 외부에는 모두 같은 인증 실패로 보입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRejection {
    Blocked,
    SubjectMismatch,
    TokenMismatch,
    Expired,
}

impl SessionRejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionRejection::Blocked => "blocked session",
            SessionRejection::SubjectMismatch => "incorrect session user",
            SessionRejection::TokenMismatch => "mismatched session token",
            SessionRejection::Expired => "expired session",
        }
    }
}

impl std::fmt::Display for SessionRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Session {
    /// 제출된 Refresh Token에 대해 세션 유효성 확인
    ///
    /// 차단 → 주체 → 토큰 원문 → 만료 순으로 검사하며 첫 실패에서 멈춥니다.
    pub fn validate(
        &self,
        payload: &Payload,
        presented_token: &str,
        now: DateTime<Utc>,
    ) -> Result<(), SessionRejection> {
        if self.is_blocked {
            return Err(SessionRejection::Blocked);
        }

        if self.subject != payload.subject {
            return Err(SessionRejection::SubjectMismatch);
        }

        if self.refresh_token != presented_token {
            return Err(SessionRejection::TokenMismatch);
        }

        if self.is_expired_at(now) {
            return Err(SessionRejection::Expired);
        }

        Ok(())
    }

    /// 주어진 시각 기준 만료 여부 (`expires_at` 시각부터 만료)
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// 요청 출처 메타데이터
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMetadata {
    pub user_agent: String,
    pub client_ip: String,
}

/// 세션 생성 파라미터
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSessionParams {
    pub id: TokenId,
    pub subject: String,
    pub refresh_token: String,
    pub user_agent: String,
    pub client_ip: String,
    pub is_blocked: bool,
    pub expires_at: DateTime<Utc>,
}

impl CreateSessionParams {
    /// 방금 발급한 Refresh Token으로 파라미터 구성
    pub fn for_refresh_token(
        refresh_token: impl Into<String>,
        payload: &Payload,
        metadata: ClientMetadata,
    ) -> Self {
        Self {
            id: payload.id,
            subject: payload.subject.clone(),
            refresh_token: refresh_token.into(),
            user_agent: metadata.user_agent,
            client_ip: metadata.client_ip,
            is_blocked: false,
            expires_at: payload.expired_at,
        }
    }

    /// 저장 시점의 세션 값
    pub fn into_session(self, created_at: DateTime<Utc>) -> Session {
        Session {
            id: self.id,
            subject: self.subject,
            refresh_token: self.refresh_token,
            user_agent: self.user_agent,
            client_ip: self.client_ip,
            is_blocked: self.is_blocked,
            expires_at: self.expires_at,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session_for(payload: &Payload, token: &str) -> Session {
        CreateSessionParams::for_refresh_token(token, payload, ClientMetadata::default())
            .into_session(Utc::now())
    }

    #[test]
    fn test_valid_session() {
        let payload = Payload::new("alice", Duration::minutes(1), Utc::now()).unwrap();
        let session = session_for(&payload, "T");

        assert_eq!(session.id, payload.id);
        assert_eq!(session.expires_at, payload.expired_at);
        assert!(!session.is_blocked);
        assert_eq!(session.validate(&payload, "T", Utc::now()), Ok(()));
    }

    #[test]
    fn test_rejections_in_order() {
        let payload = Payload::new("alice", Duration::minutes(1), Utc::now()).unwrap();
        let now = Utc::now();

        let mut session = session_for(&payload, "T");
        session.is_blocked = true;
        session.subject = "bob".to_string();
        assert_eq!(session.validate(&payload, "other", now), Err(SessionRejection::Blocked));

        session.is_blocked = false;
        assert_eq!(
            session.validate(&payload, "other", now),
            Err(SessionRejection::SubjectMismatch)
        );

        session.subject = "alice".to_string();
        assert_eq!(
            session.validate(&payload, "other", now),
            Err(SessionRejection::TokenMismatch)
        );

        session.expires_at = now;
        assert_eq!(session.validate(&payload, "T", now), Err(SessionRejection::Expired));
    }
}
