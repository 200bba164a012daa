//! Pool risk scoring.
//!
//! Maps a [`PoolMetrics`] snapshot to a bounded [`RiskScore`] and a list of
//! [`AnomalyFlag`]s. Everything in this crate is pure: no async, no IO, no
//! hidden state. Callers own collection, signing and submission.

pub mod anomaly;
pub mod metrics;
pub mod normalize;
pub mod score;
pub mod thresholds;

pub use anomaly::{AnomalyFlag, detect_anomalies};
pub use metrics::{MetricsError, PoolMetrics, failure_rate};
pub use normalize::{NormalizedMetrics, normalize};
pub use score::{RiskAssessment, RiskScore, assess, score};
