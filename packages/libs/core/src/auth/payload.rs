//! 토큰 Payload
//!
//! Access Token과 Refresh Token이 공통으로 담는 내용입니다.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::id::TokenId;

/// 토큰 Payload
///
/// 토큰 안에서만 존재하며, 검증 결과로만 꺼낼 수 있습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    /// Token ID (Refresh Token이면 세션 ID)
    pub id: TokenId,

    /// Subject (이메일 또는 사용자명)
    pub subject: String,

    /// 발급 시각
    pub issued_at: DateTime<Utc>,

    /// 만료 시각
    pub expired_at: DateTime<Utc>,
}

impl Payload {
    /// 새 payload 생성
    ///
    /// 만료 시각이 표현 범위를 넘으면 `InvalidArgument`입니다.
    pub fn new(subject: impl Into<String>, duration: Duration, now: DateTime<Utc>) -> Result<Self> {
        let expired_at = now
            .checked_add_signed(duration)
            .ok_or_else(|| Error::InvalidArgument {
                message: format!("token duration out of range: {}", duration),
            })?;

        Ok(Self {
            id: TokenId::new(),
            subject: subject.into(),
            issued_at: now,
            expired_at,
        })
    }

    /// 주어진 시각 기준 만료 여부
    ///
    /// `expired_at` 시각부터 만료입니다.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expired_at <= now
    }
}
