//! 健康检查聚合
//!
//! 以名称登记若干 `CheckFn`，`check_all` 并发执行全部探针并汇总为 `HealthReport`。
//!
use dashmap::DashMap;
use futures_util::future::join_all;
use relay_broker::Context;
use relay_broker::broker::CheckFn;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Up,
    Down(String),
}

impl HealthStatus {
    pub fn is_up(&self) -> bool {
        matches!(self, HealthStatus::Up)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthReport {
    pub checks: BTreeMap<String, HealthStatus>,
}

impl HealthReport {
    /// 所有探针均为 `Up` 时健康；没有探针时也视为健康
    pub fn is_healthy(&self) -> bool {
        self.checks.values().all(HealthStatus::is_up)
    }

    pub fn status(&self, name: &str) -> Option<&HealthStatus> {
        self.checks.get(name)
    }
}

#[derive(Default)]
pub struct HealthRegistry {
    checks: DashMap<String, CheckFn>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记探针；同名探针后者覆盖前者
    pub fn register(&self, name: impl Into<String>, check: CheckFn) {
        self.checks.insert(name.into(), check);
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub async fn check_all(&self, ctx: &Context) -> HealthReport {
        // 先复制出探针再执行，避免跨 await 持有 DashMap 分片锁
        let probes: Vec<(String, CheckFn)> = self
            .checks
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        let results = join_all(probes.into_iter().map(|(name, check)| {
            let ctx = ctx.clone();
            async move {
                let status = match check(ctx).await {
                    Ok(()) => HealthStatus::Up,
                    Err(e) => {
                        tracing::warn!(probe = %name, error = %e, "health check failed");
                        HealthStatus::Down(e.to_string())
                    }
                };
                (name, status)
            }
        }))
        .await;

        HealthReport {
            checks: results.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::future::BoxFuture;
    use relay_broker::{Broker, BrokerError, BrokerResult, InMemoryBroker};
    use std::sync::Arc;

    fn failing() -> CheckFn {
        Arc::new(|_ctx: Context| -> BoxFuture<'static, BrokerResult<()>> {
            Box::pin(async { Err(BrokerError::transport("connection refused")) })
        })
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn empty_registry_is_healthy() {
        let registry = HealthRegistry::new();
        let report = registry.check_all(&Context::background()).await;
        assert!(registry.is_empty());
        assert!(report.is_healthy());
        assert!(report.checks.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn one_failing_probe_makes_report_unhealthy() {
        let broker = InMemoryBroker::new();
        let registry = HealthRegistry::new();
        registry.register("memory", broker.health_check());
        registry.register("upstream", failing());

        let report = registry.check_all(&Context::background()).await;
        assert_eq!(registry.len(), 2);
        assert!(!report.is_healthy());
        assert_eq!(report.status("memory"), Some(&HealthStatus::Up));
        assert!(matches!(
            report.status("upstream"),
            Some(HealthStatus::Down(reason)) if reason.contains("connection refused")
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn closed_broker_reports_down() {
        let ctx = Context::background();
        let broker = InMemoryBroker::new();
        let registry = HealthRegistry::new();
        registry.register("memory", broker.health_check());
        assert!(registry.check_all(&ctx).await.is_healthy());

        broker.close(&ctx).await.unwrap();
        let report = registry.check_all(&ctx).await;
        assert!(!report.is_healthy());
        assert!(!report.status("memory").unwrap().is_up());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn register_replaces_same_name() {
        let broker = InMemoryBroker::new();
        let registry = HealthRegistry::new();
        registry.register("memory", failing());
        registry.register("memory", broker.health_check());

        assert_eq!(registry.len(), 1);
        assert!(registry.check_all(&Context::background()).await.is_healthy());
    }
}
