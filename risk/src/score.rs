use std::fmt;

use serde::{Deserialize, Serialize};

use crate::anomaly::{AnomalyFlag, detect_anomalies};
use crate::metrics::PoolMetrics;
use crate::normalize::{NormalizedMetrics, normalize};

/// Bounded risk score in [0, 100]. Higher is riskier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct RiskScore(u8);

impl RiskScore {
    pub const MAX: RiskScore = RiskScore(100);

    pub fn new(value: u8) -> Option<Self> {
        (value <= Self::MAX.0).then_some(Self(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for RiskScore {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("risk score {value} exceeds 100"))
    }
}

impl From<RiskScore> for u8 {
    fn from(score: RiskScore) -> Self {
        score.0
    }
}

impl fmt::Display for RiskScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Full scoring output for one metrics snapshot.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub score: RiskScore,
    pub anomalies: Vec<AnomalyFlag>,
    pub normalized: NormalizedMetrics,
}

/// Score a metrics snapshot.
///
/// Weighted sum of the normalized metrics, scaled to 100 and rounded to the
/// nearest integer. Total over every input, including `swap_count == 0`.
pub fn score(metrics: &PoolMetrics) -> RiskScore {
    from_normalized(&normalize(metrics))
}

/// Score plus anomaly flags plus the normalized breakdown used for logging.
pub fn assess(metrics: &PoolMetrics) -> RiskAssessment {
    let normalized = normalize(metrics);
    RiskAssessment {
        score: from_normalized(&normalized),
        anomalies: detect_anomalies(metrics),
        normalized,
    }
}

fn from_normalized(normalized: &NormalizedMetrics) -> RiskScore {
    let scaled = (normalized.weighted_sum() * 100.0).round();
    // weighted_sum is in [0, 1]; the clamp only absorbs float dust.
    RiskScore(scaled.clamp(0.0, 100.0) as u8)
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

    #[test]
    fn placeholder_pool_scores_33() {
        let m = PoolMetrics {
            gas_used: 1_000_000,
            ..metrics(500_000.0, 1_000_000.0, 0.02, 500, 5)
        };
        assert_eq!(score(&m).value(), 33);
    }

    #[test]
    fn stressed_pool_scores_90() {
        let m = metrics(2_000_000.0, 50_000.0, 0.1, 2_000, 200);
        assert_eq!(score(&m).value(), 90);
    }

    #[test]
    fn volume_alone_saturates_at_25() {
        let m = metrics(1_000_000.0, 10_000_000.0, 0.0, 0, 0);
        assert_eq!(score(&m).value(), 25);

        let m = metrics(50_000_000.0, 10_000_000.0, 0.0, 0, 0);
        assert_eq!(score(&m).value(), 25);
    }

    #[test]
    fn empty_pool_scores_only_tvl() {
        // No swaps: failure rate is 0, TVL of 0 normalizes to 1 -> 0.20 * 100
        let m = metrics(0.0, 0.0, 0.0, 0, 0);
        assert_eq!(score(&m).value(), 20);
    }

    #[test]
    fn worst_case_is_100() {
        let m = metrics(1e9, 0.0, 1.0, 1_000_000, 1_000_000);
        assert_eq!(score(&m), RiskScore::MAX);
    }

    #[test]
    fn deep_idle_pool_is_zero() {
        let m = metrics(0.0, 1e9, 0.0, 0, 0);
        assert_eq!(score(&m).value(), 0);
    }

    #[test]
    fn assess_bundles_score_and_flags() {
        let a = assess(&metrics(2_000_000.0, 50_000.0, 0.1, 2_000, 200));
        assert_eq!(a.score.value(), 90);
        assert_eq!(a.anomalies.len(), 5);
        assert_eq!(a.normalized.volume, 1.0);
    }

    #[test]
    fn nonzero_score_without_anomalies() {
        let a = assess(&metrics(500_000.0, 1_000_000.0, 0.02, 500, 5));
        assert!(a.score.value() > 0);
        assert!(a.anomalies.is_empty());
    }

    #[test]
    fn risk_score_rejects_out_of_range() {
        assert!(RiskScore::new(100).is_some());
        assert!(RiskScore::new(101).is_none());
        assert!(serde_json::from_str::<RiskScore>("101").is_err());
        assert_eq!(serde_json::from_str::<RiskScore>("42").unwrap().value(), 42);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn valid_metrics() -> impl Strategy<Value = PoolMetrics> {
        (
            0.0..=10_000_000.0f64,
            0.0..=10_000_000.0f64,
            0.0..=1.0f64,
            1..=100_000u64,
            any::<u64>(),
            any::<u64>(),
        )
            .prop_map(|(volume, tvl, impact, swaps, failed_seed, gas)| PoolMetrics {
                volume_usd: volume,
                tvl_usd: tvl,
                price_impact: impact,
                swap_count: swaps,
                failed_tx_count: failed_seed % (swaps + 1),
                gas_used: gas,
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(1000))]

        #[test]
        fn score_is_bounded(m in valid_metrics()) {
            prop_assert!(score(&m).value() <= 100);
        }

        #[test]
        fn score_ignores_gas(m in valid_metrics(), gas in any::<u64>()) {
            let other = PoolMetrics { gas_used: gas, ..m.clone() };
            prop_assert_eq!(score(&m), score(&other));
        }

        #[test]
        fn more_volume_never_lowers_score(m in valid_metrics(), extra in 0.0..=5_000_000.0f64) {
            let bumped = PoolMetrics { volume_usd: m.volume_usd + extra, ..m.clone() };
            prop_assert!(score(&bumped) >= score(&m));
        }

        #[test]
        fn more_tvl_never_raises_score(m in valid_metrics(), extra in 0.0..=5_000_000.0f64) {
            let bumped = PoolMetrics { tvl_usd: m.tvl_usd + extra, ..m.clone() };
            prop_assert!(score(&bumped) <= score(&m));
        }

        #[test]
        fn more_price_impact_never_lowers_score(m in valid_metrics(), extra in 0.0..=1.0f64) {
            let bumped = PoolMetrics {
                price_impact: (m.price_impact + extra).min(1.0),
                ..m.clone()
            };
            prop_assert!(score(&bumped) >= score(&m));
        }

        // With failures present, extra swaps dilute the failure rate, so the
        // property only holds while the rate itself stays fixed at zero.
        #[test]
        fn more_swaps_never_lower_score_without_failures(m in valid_metrics(), extra in 0..=100_000u64) {
            let base = PoolMetrics { failed_tx_count: 0, ..m };
            let bumped = PoolMetrics { swap_count: base.swap_count + extra, ..base.clone() };
            prop_assert!(score(&bumped) >= score(&base));
        }

        #[test]
        fn more_failures_never_lower_score(m in valid_metrics(), extra in 0..=1_000u64) {
            let failed = (m.failed_tx_count + extra).min(m.swap_count);
            let bumped = PoolMetrics { failed_tx_count: failed, ..m.clone() };
            prop_assert!(score(&bumped) >= score(&m));
        }

        #[test]
        fn anomalies_do_not_affect_score(m in valid_metrics()) {
            prop_assert_eq!(assess(&m).score, score(&m));
        }

        #[test]
        fn score_is_total_over_garbage(
            volume in any::<f64>(),
            tvl in any::<f64>(),
            impact in any::<f64>(),
            swaps in any::<u64>(),
            failed in any::<u64>(),
        ) {
            let m = PoolMetrics {
                volume_usd: volume,
                tvl_usd: tvl,
                price_impact: impact,
                swap_count: swaps,
                failed_tx_count: failed,
                gas_used: 0,
            };
            prop_assert!(score(&m).value() <= 100);
        }
    }
}
