//! 应用装配（relay-app）
//!
//! 把 relay-broker 接入一个进程所需的外围部分：
//! - `config`：默认值、配置文件与 `RELAY__` 环境变量的合并；
//! - `logging`：按配置安装 `tracing` 订阅器；
//! - `bootstrap`：按配置构造并打开 Broker；
//! - `health`：聚合各 Broker 的健康探针。
//!
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;

pub use bootstrap::connect;
pub use crate::config::{BrokerSettings, LogSettings, Settings, load_config, load_config_from};
pub use error::{AppError, AppResult};
pub use health::{HealthRegistry, HealthReport, HealthStatus};
