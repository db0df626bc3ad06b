/// 应用装配示例
/// 从环境变量加载配置、初始化日志、构造 Broker 并汇总健康状态
use anyhow::Result as AnyResult;
use relay_app::{HealthRegistry, connect, load_config, logging};
use relay_broker::broker::{Event, PublishOptions, SubscribeOptions};
use relay_broker::{Context, Message};
use std::sync::Arc;

#[tokio::main]
async fn main() -> AnyResult<()> {
    let settings = load_config(None)?;
    logging::init(&settings.log)?;

    let ctx = Context::background();
    let broker = connect(&settings.broker, &ctx).await?;

    let health = HealthRegistry::new();
    health.register(broker.name(), broker.health_check());

    let sub = broker
        .subscribe(
            &ctx,
            "greetings",
            Arc::new(|event: Event| async move {
                let text: String = event.message().unmarshal_body_to()?;
                tracing::info!(topic = event.topic(), %text, "received");
                anyhow::Ok(())
            }),
            SubscribeOptions::default(),
        )
        .await?;

    let msg = Message::new("hello", &settings.broker.default_content_type, &[])?;
    broker
        .publish(&ctx, "greetings", &msg, PublishOptions::default())
        .await?;
    sub.unsubscribe().await?;

    let report = health.check_all(&ctx).await;
    println!("healthy={} checks={:?}", report.is_healthy(), report.checks);

    broker.close(&ctx).await?;
    println!("healthy after close={}", health.check_all(&ctx).await.is_healthy());
    Ok(())
}
