/// 内存 Broker 示例
/// 展示广播订阅与消费组共存、处理器失败不影响其他订阅，以及幂等退订
use anyhow::Result as AnyResult;
use async_trait::async_trait;
use relay_broker::broker::{Broker, Event, Handler, PublishOptions, SubscribeOptions};
use relay_broker::{Context, InMemoryBroker, Message};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Serialize, Deserialize)]
struct OrderPlaced {
    id: u64,
    amount: f64,
}

struct CountingHandler {
    name: &'static str,
    counter: Arc<AtomicUsize>,
}

impl CountingHandler {
    fn new(name: &'static str, counter: &Arc<AtomicUsize>) -> Arc<Self> {
        Arc::new(Self {
            name,
            counter: counter.clone(),
        })
    }
}

#[async_trait]
impl Handler for CountingHandler {
    async fn handle(&self, event: Event) -> AnyResult<()> {
        let order: OrderPlaced = event.message().unmarshal_body_to()?;
        self.counter.fetch_add(1, Ordering::SeqCst);
        println!("[{}] topic={} order={order:?}", self.name, event.topic());
        Ok(())
    }
}

#[tokio::main]
async fn main() -> AnyResult<()> {
    let ctx = Context::background();
    let broker = InMemoryBroker::new();
    broker.open(&ctx).await?;

    let audit = Arc::new(AtomicUsize::new(0));
    let worker_a = Arc::new(AtomicUsize::new(0));
    let worker_b = Arc::new(AtomicUsize::new(0));

    // 广播：每条消息都会收到
    let audit_sub = broker
        .subscribe(
            &ctx,
            "orders",
            CountingHandler::new("audit", &audit),
            SubscribeOptions::default(),
        )
        .await?;

    // 消费组：每条消息只有一名成员收到
    for (name, counter) in [("worker-a", &worker_a), ("worker-b", &worker_b)] {
        broker
            .subscribe(
                &ctx,
                "orders",
                CountingHandler::new(name, counter),
                SubscribeOptions::queue("billing"),
            )
            .await?;
    }

    // 失败的处理器只会记录日志，不影响兄弟订阅
    broker
        .subscribe(
            &ctx,
            "orders",
            Arc::new(|_event: Event| async { Err::<(), _>(anyhow::anyhow!("flaky consumer")) }),
            SubscribeOptions::default(),
        )
        .await?;

    for id in 1..=4 {
        let msg = Message::new(&OrderPlaced { id, amount: 10.0 * id as f64 }, "json", &[])?;
        broker
            .publish(&ctx, "orders", &msg, PublishOptions::default())
            .await?;
    }

    audit_sub.unsubscribe().await?;
    audit_sub.unsubscribe().await?;

    let msg = Message::new(&OrderPlaced { id: 5, amount: 50.0 }, "msgpack", &[])?;
    broker
        .publish(&ctx, "orders", &msg, PublishOptions::default())
        .await?;

    println!(
        "audit={} worker-a={} worker-b={}",
        audit.load(Ordering::SeqCst),
        worker_a.load(Ordering::SeqCst),
        worker_b.load(Ordering::SeqCst),
    );
    assert_eq!(audit.load(Ordering::SeqCst), 4);
    assert_eq!(
        worker_a.load(Ordering::SeqCst) + worker_b.load(Ordering::SeqCst),
        5
    );

    broker.close(&ctx).await?;
    Ok(())
}
