//! Fixed scoring weights and anomaly thresholds.

/// Contribution of each normalized metric to the final score. Sums to 1.0.
pub mod weights {
    pub const VOLUME: f64 = 0.25;
    pub const TVL: f64 = 0.20;
    pub const PRICE_IMPACT: f64 = 0.25;
    pub const SWAP_COUNT: f64 = 0.15;
    pub const FAILURE_RATE: f64 = 0.15;
}

/// $1M traded in the period.
pub const HIGH_VOLUME_USD: f64 = 1_000_000.0;

/// $100K locked. Below this the pool counts as shallow.
pub const MIN_TVL_USD: f64 = 100_000.0;

/// 5% price impact.
pub const MAX_PRICE_IMPACT: f64 = 0.05;

/// Swaps per period.
pub const HIGH_SWAP_COUNT: u64 = 1_000;

/// 5% of swaps failed.
pub const HIGH_FAILURE_RATE: f64 = 0.05;
