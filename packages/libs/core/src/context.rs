//! 호출 컨텍스트
//!
//! 호출자의 취소 신호와 데드라인을 저장소 호출까지 전달합니다.
//! 코어는 자체 타임아웃을 두지 않습니다.

use std::future::Future;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::{Error, Result};

/// 호출 컨텍스트
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    deadline: Option<Instant>,
    cancel: Option<watch::Receiver<bool>>,
}

/// 취소 신호 송신측
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// 연결된 모든 컨텍스트 취소
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

impl CallContext {
    /// 제한 없는 컨텍스트
    pub fn background() -> Self {
        Self::default()
    }

    /// 데드라인 설정
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// 타임아웃 설정 (지금부터)
    ///
    /// `Instant`로 표현할 수 없을 만큼 긴 타임아웃은 데드라인 없음과 같습니다.
    pub fn with_timeout(self, timeout: std::time::Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    /// 취소 가능한 컨텍스트와 핸들 생성
    pub fn with_cancel(mut self) -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        self.cancel = Some(rx);
        (self, CancelHandle { tx })
    }

    /// 이미 취소되었는지
    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// 컨텍스트 안에서 future 실행
    ///
    /// 취소 신호가 먼저 오면 `Cancelled`, 데드라인이 먼저 지나면 `DeadlineExceeded`입니다.
    pub async fn run<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = T>,
    {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let mut cancel = self.cancel.clone();
        let cancelled = async move {
            match cancel.as_mut() {
                Some(rx) => {
                    // 송신측이 사라지면 더 이상 취소될 수 없습니다.
                    let closed = rx.wait_for(|cancelled| *cancelled).await.is_err();
                    if closed {
                        std::future::pending::<()>().await;
                    }
                }
                None => std::future::pending::<()>().await,
            }
        };

        let deadline = self.deadline;
        let expired = async move {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancelled => Err(Error::Cancelled),
            _ = expired => Err(Error::DeadlineExceeded),
            output = fut => Ok(output),
        }
    }
}
