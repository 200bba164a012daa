//! Chain-facing side of the operator.
//!
//! - `bindings`: minimal contract interfaces (hook registry, service manager, EigenLayer)
//! - `client`:   the `ChainClient` / `TaskSource` seams the operator is written against
//! - `digest`:   what exactly gets signed for a task response
//! - `evm`:      JSON-RPC implementation of both seams on top of alloy
//! - `registration`: hook-registry vs EigenLayer stake-registry registration

pub mod bindings;
pub mod client;
pub mod digest;
pub mod errors;
pub mod evm;
pub mod registration;
pub mod types;

pub use client::{ChainClient, TaskSource, TaskStream};
pub use errors::ChainError;
pub use evm::EvmChainClient;
pub use registration::{EigenLayerContracts, Registration};
pub use types::{RiskTask, SignedResponse, TaskEvent, TxReceipt};

pub use alloy::primitives::{Address, B256, Signature, U256};
