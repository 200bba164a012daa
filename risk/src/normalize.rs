//! Per-metric normalization into [0, 1].
//!
//! Higher always means riskier. TVL is inverted: a deep pool normalizes to 0.

use serde::Serialize;

use crate::metrics::{PoolMetrics, failure_rate};
use crate::thresholds::{
    HIGH_FAILURE_RATE, HIGH_SWAP_COUNT, HIGH_VOLUME_USD, MAX_PRICE_IMPACT, MIN_TVL_USD, weights,
};

/// Normalized view of a [`PoolMetrics`] value. Every field is in [0, 1].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct NormalizedMetrics {
    pub volume: f64,
    pub tvl: f64,
    pub price_impact: f64,
    pub swap_count: f64,
    pub failure_rate: f64,
}

impl NormalizedMetrics {
    /// Weighted sum of the components, in [0, 1].
    pub fn weighted_sum(&self) -> f64 {
        self.volume * weights::VOLUME
            + self.tvl * weights::TVL
            + self.price_impact * weights::PRICE_IMPACT
            + self.swap_count * weights::SWAP_COUNT
            + self.failure_rate * weights::FAILURE_RATE
    }
}

pub fn normalize(metrics: &PoolMetrics) -> NormalizedMetrics {
    NormalizedMetrics {
        volume: unit(metrics.volume_usd / HIGH_VOLUME_USD),
        tvl: unit(1.0 - metrics.tvl_usd / MIN_TVL_USD),
        price_impact: unit(metrics.price_impact / MAX_PRICE_IMPACT),
        swap_count: unit(metrics.swap_count as f64 / HIGH_SWAP_COUNT as f64),
        failure_rate: unit(failure_rate(metrics) / HIGH_FAILURE_RATE),
    }
}

/// Clamp into [0, 1]. NaN maps to 0; infinities clamp to the nearest bound.
fn unit(x: f64) -> f64 {
    if x.is_nan() {
        return 0.0;
    }
    x.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(volume: f64, tvl: f64, impact: f64, swaps: u64, failed: u64) -> PoolMetrics {
        PoolMetrics {
            volume_usd: volume,
            tvl_usd: tvl,
            price_impact: impact,
            swap_count: swaps,
            failed_tx_count: failed,
            gas_used: 0,
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn mid_range_values_scale_linearly() {
        let n = normalize(&metrics(500_000.0, 1_000_000.0, 0.02, 500, 5));

        assert!(close(n.volume, 0.5));
        assert!(close(n.tvl, 0.0));
        assert!(close(n.price_impact, 0.4));
        assert!(close(n.swap_count, 0.5));
        assert!(close(n.failure_rate, 0.2));
    }

    #[test]
    fn oversized_values_saturate() {
        let n = normalize(&metrics(5_000_000.0, 0.0, 0.9, 10_000, 10_000));

        assert_eq!(n.volume, 1.0);
        assert_eq!(n.tvl, 1.0);
        assert_eq!(n.price_impact, 1.0);
        assert_eq!(n.swap_count, 1.0);
        assert_eq!(n.failure_rate, 1.0);
    }

    #[test]
    fn tvl_is_inverted() {
        assert!(close(normalize(&metrics(0.0, 25_000.0, 0.0, 1, 0)).tvl, 0.75));
        assert_eq!(normalize(&metrics(0.0, 100_000.0, 0.0, 1, 0)).tvl, 0.0);
        assert_eq!(normalize(&metrics(0.0, 1e12, 0.0, 1, 0)).tvl, 0.0);
    }

    #[test]
    fn zero_swaps_normalize_failure_rate_to_zero() {
        let n = normalize(&metrics(0.0, 1e6, 0.0, 0, 0));
        assert_eq!(n.failure_rate, 0.0);
        assert_eq!(n.swap_count, 0.0);
    }

    #[test]
    fn garbage_inputs_stay_in_unit_interval() {
        let n = normalize(&metrics(f64::NAN, f64::NEG_INFINITY, -3.0, 0, 0));

        assert_eq!(n.volume, 0.0);
        assert_eq!(n.tvl, 1.0);
        assert_eq!(n.price_impact, 0.0);
    }

    #[test]
    fn infinities_clamp_to_bounds() {
        let n = normalize(&metrics(f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, 0, 0));

        assert_eq!(n.volume, 1.0);
        assert_eq!(n.tvl, 0.0);
        assert_eq!(n.price_impact, 0.0);
    }

    #[test]
    fn weighted_sum_of_all_ones_is_one() {
        let n = NormalizedMetrics {
            volume: 1.0,
            tvl: 1.0,
            price_impact: 1.0,
            swap_count: 1.0,
            failure_rate: 1.0,
        };
        assert!(close(n.weighted_sum(), 1.0));
    }
}
