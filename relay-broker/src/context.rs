//! 调用上下文（Context）
//!
//! 为 Broker 的各项操作携带取消信号与可选截止时间：
//! - 基于 `CancellationToken`，父上下文取消会级联到所有子上下文；
//! - 截止时间只在入口处检查，内存实现不会在分发途中轮询；
//! - 外部适配器可用 `cancelled()` 为网络 I/O 设置取消点。
//!
use crate::error::{BrokerError, BrokerResult};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

#[derive(Clone, Debug, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// 永不取消、无截止时间的根上下文
    pub fn background() -> Self {
        Self::default()
    }

    /// 以已有的取消令牌构造上下文
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// 派生子上下文：父上下文取消时子上下文随之取消，反之不影响父上下文
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// 派生带超时的子上下文；若父上下文的截止时间更早则沿用父上下文的
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        Self {
            token: self.token.child_token(),
            deadline: Some(match self.deadline {
                Some(parent) if parent < deadline => parent,
                _ => deadline,
            }),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_done(&self) -> bool {
        self.err().is_err()
    }

    /// 上下文已结束时返回对应错误，否则返回 `Ok(())`
    pub fn err(&self) -> BrokerResult<()> {
        if self.token.is_cancelled() {
            return Err(BrokerError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(BrokerError::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// 等待取消信号（不感知截止时间）
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_is_never_done() {
        let ctx = Context::background();
        assert!(!ctx.is_done());
        assert!(ctx.deadline().is_none());
    }

    #[test]
    fn cancel_propagates_to_children_only() {
        let parent = Context::background();
        let child = parent.child();

        child.cancel();
        assert!(matches!(child.err(), Err(BrokerError::Cancelled)));
        assert!(parent.err().is_ok());

        let child = parent.child();
        parent.cancel();
        assert!(child.is_done());
    }

    #[test]
    fn elapsed_deadline_reports_deadline_exceeded() {
        let ctx = Context::background().with_timeout(Duration::ZERO);
        assert!(matches!(ctx.err(), Err(BrokerError::DeadlineExceeded)));
    }

    #[test]
    fn child_keeps_earlier_parent_deadline() {
        let parent = Context::background().with_timeout(Duration::from_secs(1));
        let child = parent.with_timeout(Duration::from_secs(60));
        assert_eq!(child.deadline(), parent.deadline());
    }
}
