//! 发布/订阅选项
//!
use bon::Builder;

/// 发布选项
///
/// 目前在本层没有可识别的字段，保留为可扩展结构（如过期时间、优先级）。
#[non_exhaustive]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PublishOptions {}

impl PublishOptions {
    pub fn new() -> Self {
        Self::default()
    }
}

/// 订阅选项
///
/// - `queue`：消费组标签，为空表示广播订阅；
/// - `auto_ack`：处理成功后是否自动确认，默认开启。
#[derive(Builder, Clone, Debug, PartialEq, Eq)]
pub struct SubscribeOptions {
    #[builder(into, default)]
    queue: String,
    #[builder(default = true)]
    auto_ack: bool,
}

impl Default for SubscribeOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl SubscribeOptions {
    /// 加入名为 `name` 的消费组
    pub fn queue(name: impl Into<String>) -> Self {
        Self::builder().queue(name).build()
    }

    /// 关闭自动确认
    pub fn disable_auto_ack(mut self) -> Self {
        self.auto_ack = false;
        self
    }

    pub fn queue_group(&self) -> Option<&str> {
        if self.queue.is_empty() {
            None
        } else {
            Some(&self.queue)
        }
    }

    pub fn auto_ack(&self) -> bool {
        self.auto_ack
    }
}
