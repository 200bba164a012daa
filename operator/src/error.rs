use chain::ChainError;
use thiserror::Error;

use crate::state::OperatorState;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Service-level failures. Any of these during `start` leaves the service in `Error`.
#[derive(Error, Debug)]
pub enum OperatorError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("operator registration failed: {0:#}")]
    Registration(anyhow::Error),

    #[error("task subscription failed: {0:#}")]
    Subscription(anyhow::Error),

    #[error("invalid state transition {from} -> {to}")]
    InvalidTransition { from: OperatorState, to: OperatorState },
}

/// Failure while handling a single task. Logged and counted, never fatal to the service.
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("metric collection failed: {0:#}")]
    Metrics(anyhow::Error),

    #[error("response digest failed: {0}")]
    Digest(#[from] ChainError),

    #[error("signing failed: {0:#}")]
    Signing(anyhow::Error),

    #[error("submission failed after {attempts} attempt(s): {last_error:#}")]
    Submission {
        attempts: u32,
        last_error: anyhow::Error,
    },
}
