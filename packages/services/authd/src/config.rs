//! authd 설정

use std::env;

use anyhow::Context;

/// 저장소 호출 타임아웃 상한 (1시간)
const MAX_STORE_TIMEOUT_MS: u64 = 60 * 60 * 1000;

/// authd 설정
#[derive(Clone)]
pub struct Config {
    /// 서버 포트
    pub port: u16,

    /// 세션 DB URL (SQLite)
    pub db_url: String,

    /// 토큰 대칭키 (hex, base64 또는 32바이트 문자열)
    pub token_symmetric_key: String,

    /// Access Token 수명 (초)
    pub access_token_ttl_secs: i64,

    /// Refresh Token 수명 (초)
    pub refresh_token_ttl_secs: i64,

    /// 세션 저장소 호출 타임아웃 (밀리초)
    pub store_timeout_ms: u64,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("db_url", &self.db_url)
            .field("token_symmetric_key", &"<redacted>")
            .field("access_token_ttl_secs", &self.access_token_ttl_secs)
            .field("refresh_token_ttl_secs", &self.refresh_token_ttl_secs)
            .field("store_timeout_ms", &self.store_timeout_ms)
            .finish()
    }
}

impl Config {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 임의의 조회 함수에서 설정 로드
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        Ok(Self {
            port: lookup("PSG_AUTHD_PORT")
                .unwrap_or_else(|| "4100".to_string())
                .parse()?,

            db_url: lookup("PSG_DB_URL").unwrap_or_else(|| "sqlite://sessions.db".to_string()),

            token_symmetric_key: lookup("PSG_TOKEN_SYMMETRIC_KEY")
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("PSG_TOKEN_SYMMETRIC_KEY must be set"))?,

            access_token_ttl_secs: ttl_secs(&lookup, "PSG_ACCESS_TOKEN_TTL_SECS", 15 * 60)?,

            refresh_token_ttl_secs: ttl_secs(&lookup, "PSG_REFRESH_TOKEN_TTL_SECS", 24 * 60 * 60)?,

            store_timeout_ms: store_timeout_ms(&lookup)?,
        })
    }

    /// 코어 토큰 서비스 설정
    pub fn token_service(&self) -> anyhow::Result<psg_core::auth::TokenServiceConfig> {
        Ok(psg_core::auth::TokenServiceConfig {
            access_token_duration: ttl_delta(self.access_token_ttl_secs)?,
            refresh_token_duration: ttl_delta(self.refresh_token_ttl_secs)?,
        })
    }
}

/// 토큰 수명 (초)
///
/// 0 이하나 숫자가 아닌 값은 기본값을 씁니다. `chrono::Duration`으로 표현할 수 없으면 에러입니다.
fn ttl_secs(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: i64) -> anyhow::Result<i64> {
    let secs = lookup(key)
        .and_then(|v| v.parse().ok())
        .filter(|v: &i64| *v > 0)
        .unwrap_or(default);
    ttl_delta(secs).with_context(|| format!("{} is out of range", key))?;
    Ok(secs)
}

fn ttl_delta(secs: i64) -> anyhow::Result<chrono::Duration> {
    chrono::Duration::try_seconds(secs)
        .ok_or_else(|| anyhow::anyhow!("token ttl of {} seconds is too large", secs))
}

/// 저장소 호출 타임아웃 (밀리초)
fn store_timeout_ms(lookup: &impl Fn(&str) -> Option<String>) -> anyhow::Result<u64> {
    let ms = lookup("PSG_STORE_TIMEOUT_MS")
        .and_then(|v| v.parse().ok())
        .unwrap_or(5_000);
    if ms == 0 || ms > MAX_STORE_TIMEOUT_MS {
        anyhow::bail!(
            "PSG_STORE_TIMEOUT_MS must be between 1 and {} ms, got {}",
            MAX_STORE_TIMEOUT_MS,
            ms
        );
    }
    Ok(ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config =
            Config::from_lookup(lookup(&[("PSG_TOKEN_SYMMETRIC_KEY", "0123456789abcdef0123456789abcdef")]))
                .unwrap();

        assert_eq!(config.port, 4100);
        assert_eq!(config.access_token_ttl_secs, 900);
        assert_eq!(config.refresh_token_ttl_secs, 86400);
        assert_eq!(
            config.token_service().unwrap().access_token_duration,
            chrono::Duration::minutes(15)
        );
    }

    #[test]
    fn test_missing_key_fails() {
        assert!(Config::from_lookup(lookup(&[])).is_err());
        assert!(Config::from_lookup(lookup(&[("PSG_TOKEN_SYMMETRIC_KEY", "  ")])).is_err());
    }

    #[test]
    fn test_overrides_and_redaction() {
        let config = Config::from_lookup(lookup(&[
            ("PSG_TOKEN_SYMMETRIC_KEY", "0123456789abcdef0123456789abcdef"),
            ("PSG_AUTHD_PORT", "8080"),
            ("PSG_ACCESS_TOKEN_TTL_SECS", "60"),
            ("PSG_REFRESH_TOKEN_TTL_SECS", "-5"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.access_token_ttl_secs, 60);
        assert_eq!(config.refresh_token_ttl_secs, 86400);
        assert!(!format!("{:?}", config).contains("0123456789abcdef"));
    }

    #[test]
    fn test_out_of_range_ttl_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("PSG_TOKEN_SYMMETRIC_KEY", "0123456789abcdef0123456789abcdef"),
            ("PSG_ACCESS_TOKEN_TTL_SECS", "9223372036854775807"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("PSG_ACCESS_TOKEN_TTL_SECS"), "{}", err);

        assert!(Config::from_lookup(lookup(&[
            ("PSG_TOKEN_SYMMETRIC_KEY", "0123456789abcdef0123456789abcdef"),
            ("PSG_REFRESH_TOKEN_TTL_SECS", "9223372036854775807"),
        ]))
        .is_err());
    }

    #[test]
    fn test_out_of_range_store_timeout_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("PSG_TOKEN_SYMMETRIC_KEY", "0123456789abcdef0123456789abcdef"),
            ("PSG_STORE_TIMEOUT_MS", "18446744073709551615"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("PSG_STORE_TIMEOUT_MS"), "{}", err);

        assert!(Config::from_lookup(lookup(&[
            ("PSG_TOKEN_SYMMETRIC_KEY", "0123456789abcdef0123456789abcdef"),
            ("PSG_STORE_TIMEOUT_MS", "0"),
        ]))
        .is_err());

        let config = Config::from_lookup(lookup(&[
            ("PSG_TOKEN_SYMMETRIC_KEY", "0123456789abcdef0123456789abcdef"),
            ("PSG_STORE_TIMEOUT_MS", "250"),
        ]))
        .unwrap();
        assert_eq!(config.store_timeout_ms, 250);
    }
}
