//! 投递事件（Event）
//!
//! 每次投递生成一个事件，携带主题与消息，并提供确认钩子：
//! - 内存实现不挂接确认器，`ack` 恒为成功；
//! - 外部适配器可通过 `with_acknowledger` 挂接真实确认（如抑制重投）。
//!
use crate::error::BrokerResult;
use crate::message::Message;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// 确认钩子：由具备“至少一次”语义的传输实现
#[async_trait]
pub trait Acknowledger: Send + Sync {
    async fn ack(&self, event: &Event) -> BrokerResult<()>;
}

#[derive(Clone)]
pub struct Event {
    topic: String,
    message: Message,
    acknowledger: Option<Arc<dyn Acknowledger>>,
}

impl Event {
    pub fn new(topic: impl Into<String>, message: Message) -> Self {
        Self {
            topic: topic.into(),
            message,
            acknowledger: None,
        }
    }

    pub fn with_acknowledger(mut self, acknowledger: Arc<dyn Acknowledger>) -> Self {
        self.acknowledger = Some(acknowledger);
        self
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn into_message(self) -> Message {
        self.message
    }

    pub async fn ack(&self) -> BrokerResult<()> {
        match &self.acknowledger {
            Some(acknowledger) => acknowledger.ack(self).await,
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("topic", &self.topic)
            .field("message", &self.message)
            .field("acknowledger", &self.acknowledger.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingAck {
        acked: AtomicUsize,
    }

    #[async_trait]
    impl Acknowledger for CountingAck {
        async fn ack(&self, _event: &Event) -> BrokerResult<()> {
            self.acked.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
    }

    #[tokio::test]
    async fn ack_without_hook_is_noop() {
        let event = Event::new("orders", Message::default());
        assert!(event.ack().await.is_ok());
        assert_eq!(event.topic(), "orders");
    }

    #[tokio::test]
    async fn ack_delegates_to_hook() {
        let hook = Arc::new(CountingAck::default());
        let event = Event::new("orders", Message::default()).with_acknowledger(hook.clone());
        event.ack().await.unwrap();
        event.ack().await.unwrap();
        assert_eq!(hook.acked.load(Ordering::Relaxed), 2);
    }
}
