//! 订阅句柄（Subscriber）
//!
//! 调用方持有的轻量引用：只能查询主题/选项与退订，无法读写引擎内部状态。
//!
use super::SubscribeOptions;
use crate::error::BrokerResult;
use async_trait::async_trait;

#[async_trait]
pub trait Subscriber: Send + Sync {
    /// 订阅的唯一标识
    fn id(&self) -> &str;

    fn topic(&self) -> &str;

    fn options(&self) -> &SubscribeOptions;

    /// 退订
    ///
    /// 必须幂等：第二次及之后的调用直接返回 `Ok(())` 且无副作用。
    /// 返回时该订阅保证已不再收到任何投递。
    async fn unsubscribe(&self) -> BrokerResult<()>;
}
