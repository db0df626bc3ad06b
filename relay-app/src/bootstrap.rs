//! 按配置构造 Broker
//!
use crate::config::{BrokerSettings, MEMORY_BACKEND};
use crate::error::{AppError, AppResult};
use relay_broker::{Broker, CodecRegistry, Context, InMemoryBroker};
use std::sync::Arc;

/// 构造并打开配置指定的 Broker
///
/// - 先校验 `default_content_type` 对应的 codec 已注册，失败返回 `Unimplemented`；
/// - 仅内置 `memory` 后端，其余名称返回 `UnsupportedBackend`。
pub async fn connect(settings: &BrokerSettings, ctx: &Context) -> AppResult<Arc<dyn Broker>> {
    CodecRegistry::global().require(&settings.default_content_type)?;

    let broker: Arc<dyn Broker> = match settings.backend.as_str() {
        MEMORY_BACKEND => Arc::new(InMemoryBroker::new()),
        other => return Err(AppError::UnsupportedBackend(other.to_string())),
    };

    broker.open(ctx).await?;
    tracing::info!(
        backend = broker.name(),
        content_type = %settings.default_content_type,
        "broker opened"
    );
    Ok(broker)
}
