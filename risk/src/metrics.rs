use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raw liquidity-pool metrics for one scoring period.
///
/// Built per task and thrown away afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolMetrics {
    pub volume_usd: f64,
    pub tvl_usd: f64,

    /// Ratio in [0, 1].
    pub price_impact: f64,

    pub swap_count: u64,

    /// Never greater than `swap_count`.
    pub failed_tx_count: u64,

    pub gas_used: u64,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricsError {
    #[error("{field} must be a finite, non-negative number (got {value})")]
    InvalidAmount { field: &'static str, value: f64 },

    #[error("price impact must lie in [0, 1] (got {0})")]
    PriceImpactOutOfRange(f64),

    #[error("failed tx count {failed} exceeds swap count {swaps}")]
    FailuresExceedSwaps { failed: u64, swaps: u64 },
}

impl PoolMetrics {
    /// Check the domain constraints a collector must respect.
    ///
    /// Scoring does not require this (it is total over any input); the operator
    /// calls it to reject bad collector output before signing anything.
    pub fn validate(&self) -> Result<(), MetricsError> {
        for (field, value) in [("volume_usd", self.volume_usd), ("tvl_usd", self.tvl_usd)] {
            if !value.is_finite() || value < 0.0 {
                return Err(MetricsError::InvalidAmount { field, value });
            }
        }

        if !(0.0..=1.0).contains(&self.price_impact) {
            return Err(MetricsError::PriceImpactOutOfRange(self.price_impact));
        }

        if self.failed_tx_count > self.swap_count {
            return Err(MetricsError::FailuresExceedSwaps {
                failed: self.failed_tx_count,
                swaps: self.swap_count,
            });
        }

        Ok(())
    }
}

/// Share of swaps that failed.
///
/// Zero swaps means there is no evidence of failure, so the rate is 0 rather
/// than NaN or infinity.
pub fn failure_rate(metrics: &PoolMetrics) -> f64 {
    if metrics.swap_count == 0 {
        return 0.0;
    }
    metrics.failed_tx_count as f64 / metrics.swap_count as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn healthy() -> PoolMetrics {
        PoolMetrics {
            volume_usd: 500_000.0,
            tvl_usd: 1_000_000.0,
            price_impact: 0.02,
            swap_count: 500,
            failed_tx_count: 5,
            gas_used: 1_000_000,
        }
    }

    #[test]
    fn healthy_metrics_validate() {
        assert_eq!(healthy().validate(), Ok(()));
    }

    #[test]
    fn negative_volume_rejected() {
        let m = PoolMetrics {
            volume_usd: -1.0,
            ..healthy()
        };
        assert!(matches!(
            m.validate(),
            Err(MetricsError::InvalidAmount { field: "volume_usd", .. })
        ));
    }

    #[test]
    fn nan_tvl_rejected() {
        let m = PoolMetrics {
            tvl_usd: f64::NAN,
            ..healthy()
        };
        assert!(matches!(
            m.validate(),
            Err(MetricsError::InvalidAmount { field: "tvl_usd", .. })
        ));
    }

    #[test]
    fn price_impact_above_one_rejected() {
        let m = PoolMetrics {
            price_impact: 1.5,
            ..healthy()
        };
        assert_eq!(m.validate(), Err(MetricsError::PriceImpactOutOfRange(1.5)));
    }

    #[test]
    fn more_failures_than_swaps_rejected() {
        let m = PoolMetrics {
            swap_count: 3,
            failed_tx_count: 4,
            ..healthy()
        };
        assert_eq!(
            m.validate(),
            Err(MetricsError::FailuresExceedSwaps { failed: 4, swaps: 3 })
        );
    }

    #[test]
    fn failure_rate_is_zero_without_swaps() {
        let m = PoolMetrics {
            swap_count: 0,
            failed_tx_count: 0,
            ..healthy()
        };
        assert_eq!(failure_rate(&m), 0.0);
    }

    #[test]
    fn failure_rate_is_ratio() {
        assert!((failure_rate(&healthy()) - 0.01).abs() < 1e-12);
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(healthy()).unwrap();
        assert_eq!(json["volumeUsd"], 500_000.0);
        assert_eq!(json["failedTxCount"], 5);
        assert_eq!(json["gasUsed"], 1_000_000);
    }
}
