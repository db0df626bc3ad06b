//! Broker 协议
//!
//! 定义发布、订阅、健康检查与生命周期的统一抽象；
//! 内存实现与外部消息系统的适配器都实现该 trait，调用方无需改动代码即可替换。
//!
use super::{Handler, PublishOptions, SubscribeOptions, Subscriber};
use crate::context::Context;
use crate::error::BrokerResult;
use crate::message::Message;
use async_trait::async_trait;
use futures_core::future::BoxFuture;
use std::sync::Arc;

/// 健康探针：给定上下文，报告 Broker 是否可用
pub type CheckFn = Arc<dyn Fn(Context) -> BoxFuture<'static, BrokerResult<()>> + Send + Sync>;

#[async_trait]
pub trait Broker: Send + Sync {
    /// 后端名称（用于日志与健康检查）
    fn name(&self) -> &str;

    /// 建立使用前所需的资源（例如连接外部后端）
    async fn open(&self, ctx: &Context) -> BrokerResult<()>;

    /// 向 `topic` 当前的订阅者投递消息；任何字符串（包括空串）都是合法主题
    async fn publish(
        &self,
        ctx: &Context,
        topic: &str,
        message: &Message,
        opts: PublishOptions,
    ) -> BrokerResult<()>;

    /// 注册处理器以接收 `topic` 上之后发布的消息
    async fn subscribe(
        &self,
        ctx: &Context,
        topic: &str,
        handler: Arc<dyn Handler>,
        opts: SubscribeOptions,
    ) -> BrokerResult<Box<dyn Subscriber>>;

    fn health_check(&self) -> CheckFn;

    /// 释放资源；对空的 Broker 调用不得报错
    async fn close(&self, ctx: &Context) -> BrokerResult<()>;
}
