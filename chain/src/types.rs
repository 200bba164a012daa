use alloy::primitives::{Address, B256, Signature, U256};
use risk::{AnomalyFlag, PoolMetrics, RiskScore};

use crate::bindings::IRiskServiceManager;

/// A risk-scoring request as emitted by the service manager.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RiskTask {
    pub hook: Address,
    pub task_created_block: u32,
    pub pool_id: B256,
    pub checkpoint_id: U256,
}

/// One `NewRiskTaskCreated` delivery. May arrive more than once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskEvent {
    pub task_index: u32,
    pub task: RiskTask,
}

/// Everything the operator produced for one task, ready for submission.
#[derive(Clone, Debug)]
pub struct SignedResponse {
    pub task_index: u32,
    pub metrics: PoolMetrics,
    pub risk_score: RiskScore,
    pub anomalies: Vec<AnomalyFlag>,
    pub digest: B256,
    pub signature: Signature,
    pub timestamp_ms: u64,
}

/// Mined transaction summary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: B256,
    pub block_number: Option<u64>,
}

impl From<IRiskServiceManager::RiskTask> for RiskTask {
    fn from(t: IRiskServiceManager::RiskTask) -> Self {
        Self {
            hook: t.hook,
            task_created_block: t.taskCreatedBlock,
            pool_id: t.poolId,
            checkpoint_id: t.checkpointId,
        }
    }
}

impl From<&RiskTask> for IRiskServiceManager::RiskTask {
    fn from(t: &RiskTask) -> Self {
        Self {
            hook: t.hook,
            taskCreatedBlock: t.task_created_block,
            poolId: t.pool_id,
            checkpointId: t.checkpoint_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, b256};

    #[test]
    fn binding_conversion_preserves_fields() {
        let task = RiskTask {
            hook: address!("1234567890123456789012345678901234567890"),
            task_created_block: 100,
            pool_id: b256!("00000000000000000000000000000000000000000000000000000000000000aa"),
            checkpoint_id: U256::from(7),
        };

        let sol: IRiskServiceManager::RiskTask = (&task).into();
        assert_eq!(sol.taskCreatedBlock, 100);
        assert_eq!(RiskTask::from(sol), task);
    }
}
