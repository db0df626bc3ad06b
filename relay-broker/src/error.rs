//! Broker 统一错误定义
//!
//! 聚焦参数校验、编解码、调用上下文与生命周期等最小必要集合，
//! 便于外部适配器与上层应用统一转换为 `BrokerError`。
//!
use thiserror::Error;

/// 统一错误类型
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BrokerError {
    // --- 参数/编解码 ---
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },
    #[error("unimplemented: {reason}")]
    Unimplemented { reason: String },
    #[error("codec error: codec={codec}, reason={reason}")]
    Codec { codec: String, reason: String },
    #[error("serialization error: {source}")]
    Serde {
        #[from]
        source: serde_json::Error,
    },

    // --- 调用上下文 ---
    #[error("context cancelled")]
    Cancelled,
    #[error("context deadline exceeded")]
    DeadlineExceeded,

    // --- 生命周期/传输 ---
    #[error("broker closed")]
    Closed,
    #[error("transport error: {reason}")]
    Transport { reason: String },
}

impl BrokerError {
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    pub fn unimplemented(reason: impl Into<String>) -> Self {
        Self::Unimplemented {
            reason: reason.into(),
        }
    }

    pub fn codec(codec: impl Into<String>, reason: impl ToString) -> Self {
        Self::Codec {
            codec: codec.into(),
            reason: reason.to_string(),
        }
    }

    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }

    /// 是否为 `Unimplemented`（通常意味着 codec 未注册）
    pub fn is_unimplemented(&self) -> bool {
        matches!(self, Self::Unimplemented { .. })
    }

    /// 是否由调用上下文结束导致（取消或超时）
    pub fn is_context_done(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }
}

/// 统一 Result 类型别名
pub type BrokerResult<T> = Result<T, BrokerError>;
