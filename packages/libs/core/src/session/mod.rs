//! 세션
//!
//! Refresh Token 하나당 세션 하나가 로그인 시점에 생성됩니다.
//! 세션은 차단 플래그와 만료 시각으로 Refresh Token의 사용을 통제합니다.
//!
//! 세션의 영속화는 [`SessionStore`] 구현체가 담당합니다.

mod memory;
mod model;
mod store;

pub use memory::MemorySessionStore;
pub use model::{ClientMetadata, CreateSessionParams, Session, SessionRejection};
pub use store::{SessionStore, StoreError};
