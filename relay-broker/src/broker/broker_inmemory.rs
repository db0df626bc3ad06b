//! 内存版 Broker（InMemoryBroker）
//!
//! 进程内的主题注册表 + 同步分发，满足 `Broker` 协议：
//! - 注册表为 `主题 -> 订阅列表`，由一把读写锁保护；
//! - `publish`：读锁下复制订阅列表快照后立即释放，再在调用方任务上依次执行处理器；
//!   广播订阅按注册顺序全部投递，每个消费组随机挑选一名成员投递；
//! - `subscribe`：写锁下追加订阅后才返回句柄，紧随其后的 `publish` 一定能看到该订阅；
//! - 每个订阅启动一个后台移除任务，等待退订信号后在写锁下移除自身并通知完成。
//!
//! 注意：
//! - 处理器执行期间不持有任何锁，因此在处理器内对自身订阅调用 `unsubscribe` 不会死锁；
//! - 退订返回之前已经取得快照的在途 `publish` 仍可能投递到该订阅，之后的 `publish` 不会；
//! - 丢弃句柄不会退订，订阅一直有效直到 `unsubscribe` 或 `close`。
//!
use super::{Broker, CheckFn, Event, Handler, PublishOptions, SubscribeOptions, Subscriber};
use crate::context::Context;
use crate::error::{BrokerError, BrokerResult};
use crate::message::Message;
use async_trait::async_trait;
use futures_core::future::BoxFuture;
use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};
use uuid::Uuid;

const NAME: &str = "memory";

/// 注册表中的订阅条目，仅由引擎持有
struct Entry {
    id: String,
    handler: Arc<dyn Handler>,
    opts: SubscribeOptions,
}

struct Inner {
    topics: RwLock<HashMap<String, Vec<Arc<Entry>>>>,
    /// 所有订阅退出信号的父令牌
    shutdown: CancellationToken,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl Inner {
    async fn remove(&self, topic: &str, id: &str) -> bool {
        let mut topics = self.topics.write().await;
        let Some(list) = topics.get_mut(topic) else {
            return false;
        };

        let before = list.len();
        list.retain(|e| e.id != id);
        let removed = list.len() != before;
        if list.is_empty() {
            topics.remove(topic);
        }
        removed
    }
}

/// 内存 Broker；`clone` 得到的实例共享同一个注册表
#[derive(Clone)]
pub struct InMemoryBroker {
    inner: Arc<Inner>,
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self {
            inner: Arc::new(Inner {
                topics: RwLock::new(HashMap::new()),
                shutdown: CancellationToken::new(),
            }),
        }
    }
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }

    /// 当前至少有一个订阅的主题（按字典序）
    pub async fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.inner.topics.read().await.keys().cloned().collect();
        topics.sort();
        topics
    }

    pub async fn subscriber_count(&self, topic: &str) -> usize {
        self.inner
            .topics
            .read()
            .await
            .get(topic)
            .map_or(0, Vec::len)
    }

    /// 后台移除任务：等待退出信号，在写锁下移除条目后通知完成
    async fn remove_on_exit(
        inner: Weak<Inner>,
        topic: String,
        id: String,
        exit: CancellationToken,
        removed: CancellationToken,
    ) {
        exit.cancelled().await;

        if let Some(inner) = inner.upgrade() {
            if inner.remove(&topic, &id).await {
                debug!(topic = %topic, subscriber = %id, "unsubscribed");
            }
        }

        removed.cancel();
    }

    /// 广播订阅按快照顺序全部入选；每个消费组按首次出现顺序各随机挑选一名
    fn select_targets(snapshot: &[Arc<Entry>]) -> Vec<Arc<Entry>> {
        let mut targets = Vec::with_capacity(snapshot.len());
        let mut groups: Vec<Vec<&Arc<Entry>>> = Vec::new();
        let mut group_index: HashMap<&str, usize> = HashMap::new();

        for entry in snapshot {
            match entry.opts.queue_group() {
                None => targets.push(entry.clone()),
                Some(queue) => match group_index.get(queue) {
                    Some(&i) => groups[i].push(entry),
                    None => {
                        group_index.insert(queue, groups.len());
                        groups.push(vec![entry]);
                    }
                },
            }
        }

        let mut rng = rand::thread_rng();
        for members in groups {
            if let Some(chosen) = members.choose(&mut rng) {
                targets.push(Arc::clone(chosen));
            }
        }
        targets
    }

    async fn deliver(entry: &Entry, topic: &str, message: &Message) {
        let event = Event::new(topic, message.clone());
        trace!(topic = %topic, subscriber = %entry.id, "deliver");

        match entry.handler.handle(event.clone()).await {
            Ok(()) => {
                if entry.opts.auto_ack() {
                    if let Err(err) = event.ack().await {
                        warn!(topic = %topic, subscriber = %entry.id, error = %err, "ack failed");
                    }
                }
            }
            Err(err) => {
                warn!(topic = %topic, subscriber = %entry.id, error = %err, "handler failed");
            }
        }
    }
}

#[async_trait]
impl Broker for InMemoryBroker {
    fn name(&self) -> &str {
        NAME
    }

    async fn open(&self, ctx: &Context) -> BrokerResult<()> {
        ctx.err()
    }

    async fn publish(
        &self,
        ctx: &Context,
        topic: &str,
        message: &Message,
        _opts: PublishOptions,
    ) -> BrokerResult<()> {
        ctx.err()?;

        let snapshot: Vec<Arc<Entry>> = {
            let topics = self.inner.topics.read().await;
            match topics.get(topic) {
                Some(list) => list.clone(),
                None => return Ok(()),
            }
        };

        for entry in Self::select_targets(&snapshot) {
            Self::deliver(&entry, topic, message).await;
        }
        Ok(())
    }

    async fn subscribe(
        &self,
        ctx: &Context,
        topic: &str,
        handler: Arc<dyn Handler>,
        opts: SubscribeOptions,
    ) -> BrokerResult<Box<dyn Subscriber>> {
        ctx.err()?;

        let entry = Arc::new(Entry {
            id: Uuid::new_v4().to_string(),
            handler,
            opts: opts.clone(),
        });
        let exit = self.inner.shutdown.child_token();
        let removed = CancellationToken::new();

        {
            let mut topics = self.inner.topics.write().await;
            // close 先取消令牌再清空注册表，这里需在写锁内复查
            if self.is_closed() {
                return Err(BrokerError::Closed);
            }
            topics
                .entry(topic.to_string())
                .or_default()
                .push(entry.clone());
        }

        tokio::spawn(Self::remove_on_exit(
            Arc::downgrade(&self.inner),
            topic.to_string(),
            entry.id.clone(),
            exit.clone(),
            removed.clone(),
        ));

        debug!(topic = %topic, subscriber = %entry.id, queue = ?opts.queue_group(), "subscribed");

        Ok(Box::new(InMemorySubscriber {
            id: entry.id.clone(),
            topic: topic.to_string(),
            opts,
            unsubscribing: AtomicBool::new(false),
            exit,
            removed,
        }))
    }

    fn health_check(&self) -> CheckFn {
        let shutdown = self.inner.shutdown.clone();
        Arc::new(move |ctx: Context| -> BoxFuture<'static, BrokerResult<()>> {
            let shutdown = shutdown.clone();
            Box::pin(async move {
                ctx.err()?;
                if shutdown.is_cancelled() {
                    Err(BrokerError::Closed)
                } else {
                    Ok(())
                }
            })
        })
    }

    async fn close(&self, ctx: &Context) -> BrokerResult<()> {
        ctx.err()?;

        self.inner.shutdown.cancel();
        let dropped: usize = {
            let mut topics = self.inner.topics.write().await;
            let n = topics.values().map(Vec::len).sum();
            topics.clear();
            n
        };

        debug!(subscribers = dropped, "closed");
        Ok(())
    }
}

/// 内存订阅句柄：只持有退出/完成信号，不触碰注册表
struct InMemorySubscriber {
    id: String,
    topic: String,
    opts: SubscribeOptions,
    unsubscribing: AtomicBool,
    exit: CancellationToken,
    removed: CancellationToken,
}

#[async_trait]
impl Subscriber for InMemorySubscriber {
    fn id(&self) -> &str {
        &self.id
    }

    fn topic(&self) -> &str {
        &self.topic
    }

    fn options(&self) -> &SubscribeOptions {
        &self.opts
    }

    async fn unsubscribe(&self) -> BrokerResult<()> {
        if !self.unsubscribing.swap(true, Ordering::AcqRel) {
            debug!(topic = %self.topic, subscriber = %self.id, "unsubscribe requested");
            self.exit.cancel();
        }

        // 并发的重复调用同样等到移除完成才返回
        self.removed.cancelled().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn entry(queue: &str) -> Arc<Entry> {
        let handler: Arc<dyn Handler> = Arc::new(|_event: Event| async { anyhow::Ok(()) });
        Arc::new(Entry {
            id: Uuid::new_v4().to_string(),
            handler,
            opts: SubscribeOptions::queue(queue),
        })
    }

    #[test]
    fn select_targets_keeps_broadcast_order_and_one_per_group() {
        let snapshot = vec![
            entry(""),
            entry("g1"),
            entry(""),
            entry("g2"),
            entry("g1"),
            entry(""),
        ];

        let targets = InMemoryBroker::select_targets(&snapshot);
        assert_eq!(targets.len(), 5);

        let broadcast: Vec<&str> = targets[..3].iter().map(|e| e.id.as_str()).collect();
        let expected: Vec<&str> = [0, 2, 5].iter().map(|&i| snapshot[i].id.as_str()).collect();
        assert_eq!(broadcast, expected);

        assert_eq!(targets[3].opts.queue_group(), Some("g1"));
        assert_eq!(targets[4].id, snapshot[3].id);
    }

    #[test]
    fn select_targets_on_empty_snapshot_is_empty() {
        assert!(InMemoryBroker::select_targets(&[]).is_empty());
    }

    #[tokio::test]
    async fn remover_drops_empty_topic_key() {
        let broker = InMemoryBroker::new();
        let ctx = Context::background();
        let sub = broker
            .subscribe(&ctx, "t", Arc::new(|_e: Event| async { anyhow::Ok(()) }), SubscribeOptions::default())
            .await
            .unwrap();
        assert_eq!(broker.topics().await, vec!["t".to_string()]);

        sub.unsubscribe().await.unwrap();
        assert!(broker.topics().await.is_empty());
    }

    #[tokio::test]
    async fn failing_handler_does_not_stop_siblings() {
        let broker = InMemoryBroker::new();
        let ctx = Context::background();
        let seen = Arc::new(AtomicUsize::new(0));

        broker
            .subscribe(
                &ctx,
                "t",
                Arc::new(|_e: Event| async { Err::<(), _>(anyhow::anyhow!("boom")) }),
                SubscribeOptions::default(),
            )
            .await
            .unwrap();
        let counter = seen.clone();
        broker
            .subscribe(
                &ctx,
                "t",
                Arc::new(move |_e: Event| {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        anyhow::Ok(())
                    }
                }),
                SubscribeOptions::default(),
            )
            .await
            .unwrap();

        broker
            .publish(&ctx, "t", &Message::default(), PublishOptions::default())
            .await
            .unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn dropping_last_clone_releases_remover_tasks() {
        let broker = InMemoryBroker::new();
        let ctx = Context::background();
        let sub = broker
            .subscribe(&ctx, "t", Arc::new(|_e: Event| async { anyhow::Ok(()) }), SubscribeOptions::default())
            .await
            .unwrap();

        drop(broker);
        // 引擎已释放，退订立即完成
        tokio::time::timeout(std::time::Duration::from_secs(1), sub.unsubscribe())
            .await
            .expect("unsubscribe finished")
            .unwrap();
    }
}
