//! Response digest and task naming.

use alloy::primitives::{Address, B256, U256, keccak256};
use alloy::sol_types::SolValue;
use risk::{PoolMetrics, RiskScore};

use crate::errors::ChainError;
use crate::types::RiskTask;

/// keccak256 of the JSON encoding of `metrics`.
pub fn metrics_commitment(metrics: &PoolMetrics) -> Result<B256, ChainError> {
    let json = serde_json::to_vec(metrics)?;
    Ok(keccak256(json))
}

/// Digest the operator signs for a task response:
///
/// `keccak256(abi.encodePacked(hook, poolId, checkpointId, uint256(score), metricsCommitment))`
pub fn response_digest(
    task: &RiskTask,
    score: RiskScore,
    metrics: &PoolMetrics,
) -> Result<B256, ChainError> {
    let packed = (
        task.hook,
        task.pool_id,
        task.checkpoint_id,
        U256::from(score.value()),
        metrics_commitment(metrics)?,
    )
        .abi_encode_packed();

    Ok(keccak256(packed))
}

/// `metrics_<checksummed hook>_<ts_ms>`
pub fn metrics_task_name(hook: Address, ts_ms: u64) -> String {
    format!("metrics_{}_{}", hook.to_checksum(None), ts_ms)
}

/// Pool id for a generated metrics task. Unique per task name.
pub fn metrics_task_pool_id(name: &str) -> B256 {
    keccak256(name.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, b256};
    use alloy::signers::SignerSync;
    use alloy::signers::local::PrivateKeySigner;

    fn task() -> RiskTask {
        RiskTask {
            hook: address!("5037e7747faa78fc0ecf8dfc526dcd19f73076ce"),
            task_created_block: 100,
            pool_id: b256!("1111111111111111111111111111111111111111111111111111111111111111"),
            checkpoint_id: U256::from(1),
        }
    }

    fn metrics() -> PoolMetrics {
        PoolMetrics {
            volume_usd: 500_000.0,
            tvl_usd: 1_000_000.0,
            price_impact: 0.02,
            swap_count: 500,
            failed_tx_count: 5,
            gas_used: 1_000_000,
        }
    }

    fn score(v: u8) -> RiskScore {
        RiskScore::new(v).unwrap()
    }

    #[test]
    fn digest_matches_manual_packing() {
        let t = task();
        let m = metrics();

        let mut buf = Vec::with_capacity(20 + 32 * 4);
        buf.extend_from_slice(t.hook.as_slice());
        buf.extend_from_slice(t.pool_id.as_slice());
        buf.extend_from_slice(&t.checkpoint_id.to_be_bytes::<32>());
        buf.extend_from_slice(&U256::from(33u8).to_be_bytes::<32>());
        buf.extend_from_slice(metrics_commitment(&m).unwrap().as_slice());

        assert_eq!(response_digest(&t, score(33), &m).unwrap(), keccak256(&buf));
    }

    #[test]
    fn digest_binds_score_and_metrics() {
        let t = task();
        let base = response_digest(&t, score(33), &metrics()).unwrap();

        assert_ne!(base, response_digest(&t, score(34), &metrics()).unwrap());

        let other = PoolMetrics {
            swap_count: 501,
            ..metrics()
        };
        assert_ne!(base, response_digest(&t, score(33), &other).unwrap());

        let moved = RiskTask {
            checkpoint_id: U256::from(2),
            ..task()
        };
        assert_ne!(base, response_digest(&moved, score(33), &metrics()).unwrap());
    }

    #[test]
    fn personal_signature_recovers_operator() {
        let signer = PrivateKeySigner::random();
        let digest = response_digest(&task(), score(33), &metrics()).unwrap();

        let sig = signer.sign_message_sync(digest.as_slice()).unwrap();
        let recovered = sig.recover_address_from_msg(digest.as_slice()).unwrap();

        assert_eq!(recovered, signer.address());
    }

    #[test]
    fn task_name_uses_checksummed_hook() {
        let name = metrics_task_name(task().hook, 1_700_000_000_000);
        assert_eq!(
            name,
            "metrics_0x5037e7747fAa78fc0ECF8DFC526DcD19f73076ce_1700000000000"
        );
    }

    #[test]
    fn pool_ids_differ_per_name() {
        let a = metrics_task_pool_id(&metrics_task_name(task().hook, 1));
        let b = metrics_task_pool_id(&metrics_task_name(task().hook, 2));
        assert_ne!(a, b);
    }
}
