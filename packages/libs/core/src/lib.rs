//! psg-core: Passage 인증 핵심 라이브러리
//!
//! 토큰 발급/검증, 세션 모델, Access Token 갱신 프로토콜을 제공합니다.
//! 세션 영속화, 라우팅, 비밀번호 처리는 이 크레이트 밖의 몫입니다.
//!
//! # 모듈 구조
//!
//! - `auth`: 토큰 생성기, Payload, 발급/갱신 서비스
//! - `session`: 세션 모델과 저장소 인터페이스
//! - `context`: 취소/데드라인 전달
//! - `error`: 공통 에러 타입
//! - `id`: 토큰 ID

pub mod auth;
pub mod context;
pub mod error;
pub mod id;
pub mod session;

pub use context::CallContext;
pub use error::{Error, ErrorKind, Result};
