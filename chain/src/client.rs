use alloy::primitives::{Address, B256, Signature, U256};
use async_trait::async_trait;
use futures::stream::BoxStream;
use risk::RiskScore;

use crate::types::{RiskTask, TaskEvent, TxReceipt};

/// Stream of task deliveries. Ends when the underlying subscription closes.
pub type TaskStream = BoxStream<'static, anyhow::Result<TaskEvent>>;

/// Abstraction over the chain: registry, service manager and the operator key.
///
/// Every transaction method waits for the receipt before returning, and a
/// reverted receipt is an error.
#[async_trait]
pub trait ChainClient: Send + Sync + 'static {
    /// Address of the operator key.
    fn operator(&self) -> Address;

    async fn is_operator_registered(&self) -> anyhow::Result<bool>;

    /// Register the operator, sending `stake` wei along with the call.
    async fn register_operator(&self, stake: U256) -> anyhow::Result<TxReceipt>;

    /// EIP-191 personal-sign over the 32 raw digest bytes.
    async fn sign_message(&self, digest: B256) -> anyhow::Result<Signature>;

    async fn respond_to_task(
        &self,
        task: &RiskTask,
        task_index: u32,
        score: RiskScore,
        signature: &Signature,
    ) -> anyhow::Result<TxReceipt>;

    async fn create_new_task(&self, hook: Address, pool_id: B256) -> anyhow::Result<TxReceipt>;
}

/// Source of newly created tasks. Delivery is at-least-once.
#[async_trait]
pub trait TaskSource: Send + Sync + 'static {
    async fn subscribe(&self) -> anyhow::Result<TaskStream>;
}
