//! 消息代理基础库（relay-broker）
//!
//! 为异步消息的生产者与消费者提供统一的协议与构件：
//! - 消息信封（`message`）与按 content-type 选择的编解码（`codec`）
//! - Broker 协议（`broker`）：发布、订阅、确认、退订与健康检查
//! - 内存实现（`broker::InMemoryBroker`）：单进程扇出、测试与嵌入式场景
//! - 调用上下文（`context`）与统一错误（`error`）
//!
//! 同一套调用代码既可运行在内存实现上，也可替换为外部消息系统的适配器。
//!
//! 典型用法：
//! 1. 进程启动时按需通过 `codec::register_codec` 注册额外的 codec；
//! 2. 以 `Message::new` 构造消息，`Broker::publish` 发布；
//! 3. 以 `Broker::subscribe` 注册处理器并持有返回的 `Subscriber` 句柄；
//! 4. 不再需要时调用 `Subscriber::unsubscribe`，关闭时调用 `Broker::close`。
//!
pub mod broker;
pub mod codec;
pub mod context;
pub mod error;
pub mod message;

pub use broker::{Broker, Event, Handler, PublishOptions, SubscribeOptions, Subscriber};
#[cfg(feature = "memory")]
pub use broker::InMemoryBroker;
pub use codec::{Codec, CodecRegistry};
pub use context::Context;
pub use error::{BrokerError, BrokerResult};
pub use message::Message;
