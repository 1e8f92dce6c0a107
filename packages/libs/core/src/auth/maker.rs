//! 토큰 생성 및 검증
//!
//! 하나의 대칭키로 payload를 PASETO v4.local 토큰으로 봉인하고 엽니다.
//!
//! # 토큰 형식
//!
//! ```text
//! v4.local.<base64url(nonce[32] || ciphertext || tag[32])>
//! ```
//!
//! 만료는 PASETO 등록 클레임(`exp`)이 아니라 payload의 `expired_at`으로 판단합니다.
//! 복호화가 끝난 뒤에 검사해야 `InvalidToken`과 `TokenExpired`가 섞이지 않습니다.

use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use rusty_paseto::core::{
    Footer, ImplicitAssertion, Key, Local, Paseto, PasetoNonce, PasetoSymmetricKey,
    Payload as PasetoPayload, V4,
};

use super::payload::Payload;
use crate::error::{Error, Result};

/// 토큰 헤더 (버전 + 용도)
pub const TOKEN_HEADER: &str = "v4.local.";

/// 대칭키 길이 (바이트)
pub const KEY_LEN: usize = 32;

const NONCE_LEN: usize = 32;
const TAG_LEN: usize = 32;

/// 토큰 생성기
///
/// 키는 생성 시 주입되며 이후 바뀌지 않습니다.
/// 여러 태스크에서 잠금 없이 공유할 수 있습니다.
#[derive(Clone)]
pub struct TokenMaker {
    key: [u8; KEY_LEN],
}

impl std::fmt::Debug for TokenMaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenMaker").field("key", &"<redacted>").finish()
    }
}

impl TokenMaker {
    /// 새 생성기
    ///
    /// 키가 정확히 32바이트가 아니면 `Configuration` 에러입니다.
    pub fn new(key: &[u8]) -> Result<Self> {
        let key: [u8; KEY_LEN] = key.try_into().map_err(|_| Error::Configuration {
            message: format!(
                "invalid key size: must be exactly {} bytes, got {}",
                KEY_LEN,
                key.len()
            ),
        })?;
        Ok(Self { key })
    }

    /// 키 문자열(hex, base64url, base64, raw)에서 생성
    pub fn from_key_material(raw: &str) -> Result<Self> {
        let key = parse_key_material(raw)?;
        Self::new(&key)
    }

    /// 토큰 생성
    pub fn create_token(&self, subject: &str, duration: Duration) -> Result<(String, Payload)> {
        self.create_token_at(subject, duration, Utc::now())
    }

    /// 주어진 시각을 발급 시각으로 토큰 생성
    pub fn create_token_at(
        &self,
        subject: &str,
        duration: Duration,
        now: DateTime<Utc>,
    ) -> Result<(String, Payload)> {
        if subject.is_empty() {
            return Err(Error::InvalidArgument {
                message: "subject must not be empty".to_string(),
            });
        }

        let payload = Payload::new(subject, duration, now)?;
        let json = serde_json::to_string(&payload).map_err(|e| Error::Crypto {
            message: format!("payload serialization failed: {}", e),
        })?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Key::<NONCE_LEN>::from(nonce_bytes);

        let token = Paseto::<V4, Local>::builder()
            .set_payload(PasetoPayload::from(json.as_str()))
            .try_encrypt(&self.symmetric_key(), &PasetoNonce::<V4, Local>::from(&nonce))
            .map_err(|e| Error::Crypto {
                message: format!("encryption failed: {}", e),
            })?;

        Ok((token, payload))
    }

    /// 토큰 검증
    pub fn verify_token(&self, token: &str) -> Result<Payload> {
        self.verify_token_at(token, Utc::now())
    }

    /// 주어진 시각 기준 토큰 검증
    ///
    /// 위조/손상/형식 오류는 모두 `InvalidToken`, 서명은 맞지만 기한이 지난 경우만 `TokenExpired`입니다.
    pub fn verify_token_at(&self, token: &str, now: DateTime<Utc>) -> Result<Payload> {
        let encoded = token
            .strip_prefix(TOKEN_HEADER)
            .ok_or_else(|| Error::invalid_token("unsupported token header"))?;

        // 본문 길이는 미리 확인해 둡니다.
        let body = general_purpose::URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|_| Error::invalid_token("malformed token body"))?;
        if body.len() < NONCE_LEN + TAG_LEN {
            return Err(Error::invalid_token("token body too short"));
        }

        let json = Paseto::<V4, Local>::try_decrypt(
            token,
            &self.symmetric_key(),
            None::<Footer>,
            None::<ImplicitAssertion>,
        )
        .map_err(|e| Error::invalid_token(format!("decryption failed: {}", e)))?;

        let payload: Payload = serde_json::from_str(&json)
            .map_err(|_| Error::invalid_token("payload deserialization failed"))?;

        if payload.is_expired_at(now) {
            return Err(Error::TokenExpired);
        }

        Ok(payload)
    }

    fn symmetric_key(&self) -> PasetoSymmetricKey<V4, Local> {
        PasetoSymmetricKey::<V4, Local>::from(Key::from(self.key))
    }
}

/// 키 문자열 파싱
///
/// 64자 hex, 32바이트 base64url/base64, 32바이트 raw 문자열 순으로 시도합니다.
/// 어느 쪽에도 맞지 않으면 무엇이 틀렸는지 담은 `Configuration` 에러입니다.
pub fn parse_key_material(raw: &str) -> Result<[u8; KEY_LEN]> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::Configuration {
            message: "key material is empty".to_string(),
        });
    }

    if trimmed.len() == KEY_LEN * 2 && trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
        let mut key = [0u8; KEY_LEN];
        hex::decode_to_slice(trimmed, &mut key).map_err(|e| Error::Configuration {
            message: format!("invalid hex key: {}", e),
        })?;
        return Ok(key);
    }

    let decoded = general_purpose::URL_SAFE_NO_PAD
        .decode(trimmed)
        .or_else(|_| general_purpose::STANDARD.decode(trimmed));
    if let Ok(bytes) = &decoded {
        if let Ok(key) = <[u8; KEY_LEN]>::try_from(bytes.as_slice()) {
            return Ok(key);
        }
    }

    if let Ok(key) = <[u8; KEY_LEN]>::try_from(trimmed.as_bytes()) {
        return Ok(key);
    }

    let message = match decoded {
        Ok(bytes) => format!(
            "base64 key decodes to {} bytes, expected {}",
            bytes.len(),
            KEY_LEN
        ),
        Err(_) => format!(
            "unrecognized key material: expected {} bytes as 64 hex chars, base64 or raw text, got {} chars",
            KEY_LEN,
            trimmed.len()
        ),
    };
    Err(Error::Configuration { message })
}
