//! Threshold-based anomaly detection.
//!
//! Independent of the score: a flag never changes the score and a high score
//! does not imply a flag.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::metrics::{PoolMetrics, failure_rate};
use crate::thresholds::{
    HIGH_FAILURE_RATE, HIGH_SWAP_COUNT, HIGH_VOLUME_USD, MAX_PRICE_IMPACT, MIN_TVL_USD,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalyFlag {
    HighVolume,
    LowTvl,
    HighPriceImpact,
    HighSwapCount,
    HighFailureRate,
}

impl AnomalyFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyFlag::HighVolume => "HIGH_VOLUME",
            AnomalyFlag::LowTvl => "LOW_TVL",
            AnomalyFlag::HighPriceImpact => "HIGH_PRICE_IMPACT",
            AnomalyFlag::HighSwapCount => "HIGH_SWAP_COUNT",
            AnomalyFlag::HighFailureRate => "HIGH_FAILURE_RATE",
        }
    }
}

impl fmt::Display for AnomalyFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flags raised by `metrics`, in fixed check order:
/// volume, TVL, price impact, swap count, failure rate.
///
/// All comparisons are strict, so a value sitting exactly on a threshold is not flagged.
pub fn detect_anomalies(metrics: &PoolMetrics) -> Vec<AnomalyFlag> {
    let checks = [
        (metrics.volume_usd > HIGH_VOLUME_USD, AnomalyFlag::HighVolume),
        (metrics.tvl_usd < MIN_TVL_USD, AnomalyFlag::LowTvl),
        (metrics.price_impact > MAX_PRICE_IMPACT, AnomalyFlag::HighPriceImpact),
        (metrics.swap_count > HIGH_SWAP_COUNT, AnomalyFlag::HighSwapCount),
        (failure_rate(metrics) > HIGH_FAILURE_RATE, AnomalyFlag::HighFailureRate),
    ];

    checks
        .into_iter()
        .filter_map(|(hit, flag)| hit.then_some(flag))
        .collect()
}
