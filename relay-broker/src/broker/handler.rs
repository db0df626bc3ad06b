//! 订阅处理器（Handler）
//!
//! 单方法的可调用抽象；任何 `Fn(Event) -> Future<Output = anyhow::Result<()>>`
//! 闭包都自动实现该 trait，便于捕获订阅方自身的状态。
//!
use super::Event;
use async_trait::async_trait;
use std::future::Future;

#[async_trait]
pub trait Handler: Send + Sync {
    /// 处理一次投递；返回的错误不会回传给发布方
    async fn handle(&self, event: Event) -> anyhow::Result<()>;
}

#[async_trait]
impl<F, Fut> Handler for F
where
    F: Fn(Event) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn handle(&self, event: Event) -> anyhow::Result<()> {
        (self)(event).await
    }
}
