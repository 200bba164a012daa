use async_trait::async_trait;
use chain::RiskTask;
use risk::PoolMetrics;

/// Source of pool metrics for a task.
#[async_trait]
pub trait MetricsProvider: Send + Sync + 'static {
    async fn collect(&self, task: &RiskTask) -> anyhow::Result<PoolMetrics>;
}

/// Returns the same snapshot for every task.
///
/// Stands in until an indexer-backed provider exists.
#[derive(Clone, Debug)]
pub struct StaticMetricsProvider {
    metrics: PoolMetrics,
}

impl StaticMetricsProvider {
    pub fn new(metrics: PoolMetrics) -> Self {
        Self { metrics }
    }
}

impl Default for StaticMetricsProvider {
    fn default() -> Self {
        Self::new(PoolMetrics {
            volume_usd: 500_000.0,
            tvl_usd: 1_000_000.0,
            price_impact: 0.02,
            swap_count: 500,
            failed_tx_count: 5,
            gas_used: 1_000_000,
        })
    }
}

#[async_trait]
impl MetricsProvider for StaticMetricsProvider {
    async fn collect(&self, _task: &RiskTask) -> anyhow::Result<PoolMetrics> {
        Ok(self.metrics.clone())
    }
}
