//! Broker 子系统
//!
//! 提供发布/订阅的协议与进程内实现：
//! - `Broker`：统一的打开、发布、订阅、健康检查与关闭接口；
//! - `Handler`：订阅回调，闭包即可实现；
//! - `Event`：单次投递携带的主题、消息与确认钩子；
//! - `Subscriber`：订阅句柄，用于查询主题与幂等退订；
//! - `InMemoryBroker`：基于读写锁注册表的内存实现（需启用 `memory` 特性）。
//!
//! 外部消息系统（如 NATS）只需实现 `Broker` 即可在调用方无感替换。
//!
#[cfg(feature = "memory")]
pub mod broker_inmemory;
pub mod contract;
pub mod event;
pub mod handler;
pub mod options;
pub mod subscriber;

#[cfg(feature = "memory")]
pub use broker_inmemory::InMemoryBroker;
pub use contract::{Broker, CheckFn};
pub use event::{Acknowledger, Event};
pub use handler::Handler;
pub use options::{PublishOptions, SubscribeOptions};
pub use subscriber::Subscriber;
