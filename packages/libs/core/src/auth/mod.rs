//! 인증 토큰 관련 타입 및 로직
//!
//! # 개요
//!
//! - **Access Token**: 요청마다 주체를 증명하는 짧은 수명의 토큰
//! - **Refresh Token**: 세션과 1:1로 묶인 긴 수명의 토큰, 새 Access Token으로 교환
//!
//! 두 토큰 모두 같은 [`TokenMaker`]가 같은 형식으로 만듭니다.

mod maker;
mod payload;
mod service;

pub use maker::{parse_key_material, TokenMaker, KEY_LEN, TOKEN_HEADER};
pub use payload::Payload;
pub use service::{IssuedTokens, LoginTokens, TokenService, TokenServiceConfig};
