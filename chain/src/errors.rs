use alloy::primitives::B256;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("invalid operator private key")]
    InvalidPrivateKey,

    #[error("invalid rpc url: {0}")]
    InvalidRpcUrl(String),

    #[error("{action} transaction {tx_hash} reverted")]
    Reverted { action: &'static str, tx_hash: B256 },

    #[error("signing failed: {0}")]
    Signing(#[from] alloy::signers::Error),

    #[error("failed to encode metrics: {0}")]
    Encode(#[from] serde_json::Error),
}
