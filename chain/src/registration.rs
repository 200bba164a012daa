//! How the operator registers itself.
//!
//! Two deployments exist: a hook registry with a payable `registerOperator()`,
//! and the EigenLayer stack where the operator first registers with the
//! delegation manager and then with the AVS stake registry using a salted,
//! expiring signature over the AVS directory's registration digest.

use alloy::primitives::{Address, B256, Bytes, U256, keccak256};
use alloy::signers::SignerSync;
use alloy::signers::local::PrivateKeySigner;
use alloy::sol_types::SolValue;

use crate::bindings::IECDSAStakeRegistry::SignatureWithSaltAndExpiry;
use crate::errors::ChainError;

/// Lifetime of an AVS registration signature.
pub const AVS_SIGNATURE_TTL_SECS: u64 = 3600;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EigenLayerContracts {
    pub delegation_manager: Address,
    pub avs_directory: Address,
    pub stake_registry: Address,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Registration {
    /// `IHookRegistry.registerOperator{value: stake}()`; membership via `isOperator`.
    #[default]
    HookRegistry,

    /// `registerAsOperator` + `registerOperatorWithSignature`; membership via
    /// `operatorRegistered`. No stake is sent.
    EigenLayer(EigenLayerContracts),
}

/// Salt for one registration attempt; distinct per operator, AVS and millisecond.
pub fn registration_salt(operator: Address, avs: Address, now_ms: u64) -> B256 {
    keccak256((operator, avs, U256::from(now_ms)).abi_encode_packed())
}

pub fn registration_expiry(now_secs: u64) -> U256 {
    U256::from(now_secs.saturating_add(AVS_SIGNATURE_TTL_SECS))
}

/// Sign the AVS directory digest directly (no EIP-191 prefix).
pub fn sign_avs_registration(
    signer: &PrivateKeySigner,
    digest: B256,
    salt: B256,
    expiry: U256,
) -> Result<SignatureWithSaltAndExpiry, ChainError> {
    let signature = signer.sign_hash_sync(&digest)?;

    Ok(SignatureWithSaltAndExpiry {
        signature: Bytes::copy_from_slice(&signature.as_bytes()),
        salt,
        expiry,
    })
}
