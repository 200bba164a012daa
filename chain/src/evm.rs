//! JSON-RPC implementation of [`ChainClient`] and [`TaskSource`].
//!
//! One HTTP provider with a wallet filler serves every call. Task delivery uses
//! a polling log filter on `NewRiskTaskCreated`.

use alloy::network::{EthereumWallet, ReceiptResponse};
use alloy::primitives::{Address, B256, Bytes, Signature, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionReceipt;
use alloy::signers::Signer;
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::http::reqwest::Url;
use async_trait::async_trait;
use common::time::now_ms;
use futures::StreamExt;
use risk::RiskScore;
use tracing::{debug, info, instrument};

use crate::bindings::{
    IAVSDirectory, IDelegationManager, IECDSAStakeRegistry, IHookRegistry, IRiskServiceManager,
};
use crate::client::{ChainClient, TaskSource, TaskStream};
use crate::errors::ChainError;
use crate::registration::{
    EigenLayerContracts, Registration, registration_expiry, registration_salt,
    sign_avs_registration,
};
use crate::types::{RiskTask, TaskEvent, TxReceipt};

/// Fixed gas limit for task responses.
pub const RESPONSE_GAS_LIMIT: u64 = 500_000;

#[derive(Clone)]
pub struct EvmChainClient {
    provider: DynProvider,
    signer: PrivateKeySigner,
    registry: Address,
    service_manager: Address,
    registration: Registration,
}

// Keep the key out of logs.
impl std::fmt::Debug for EvmChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvmChainClient")
            .field("operator", &self.signer.address())
            .field("registry", &self.registry)
            .field("service_manager", &self.service_manager)
            .field("registration", &self.registration)
            .finish()
    }
}

impl EvmChainClient {
    /// Build the provider and signer. No network traffic happens here.
    pub fn connect(
        rpc_url: &str,
        private_key: &str,
        registry: Address,
        service_manager: Address,
    ) -> Result<Self, ChainError> {
        let signer: PrivateKeySigner = private_key
            .trim()
            .parse()
            .map_err(|_| ChainError::InvalidPrivateKey)?;

        let url: Url = rpc_url
            .parse()
            .map_err(|_| ChainError::InvalidRpcUrl(rpc_url.to_string()))?;

        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer.clone()))
            .connect_http(url)
            .erased();

        info!(
            operator = %signer.address(),
            %registry,
            %service_manager,
            "chain client ready"
        );

        Ok(Self {
            provider,
            signer,
            registry,
            service_manager,
            registration: Registration::HookRegistry,
        })
    }

    /// Switch the registration path. Defaults to the hook registry.
    pub fn with_registration(mut self, registration: Registration) -> Self {
        self.registration = registration;
        self
    }

    pub fn registration(&self) -> Registration {
        self.registration
    }

    fn registry_contract(&self) -> IHookRegistry::IHookRegistryInstance<DynProvider> {
        IHookRegistry::new(self.registry, self.provider.clone())
    }

    fn service_manager_contract(&self) -> IRiskServiceManager::IRiskServiceManagerInstance<DynProvider> {
        IRiskServiceManager::new(self.service_manager, self.provider.clone())
    }

    fn stake_registry_contract(
        &self,
        contracts: &EigenLayerContracts,
    ) -> IECDSAStakeRegistry::IECDSAStakeRegistryInstance<DynProvider> {
        IECDSAStakeRegistry::new(contracts.stake_registry, self.provider.clone())
    }

    /// Delegation manager first, then the AVS stake registry with a salted,
    /// expiring signature over the AVS directory digest.
    async fn register_with_eigenlayer(
        &self,
        contracts: &EigenLayerContracts,
    ) -> anyhow::Result<TxReceipt> {
        let operator = self.operator();

        let details = IDelegationManager::OperatorDetails {
            deprecatedEarningsReceiver: operator,
            delegationApprover: Address::ZERO,
            stakerOptOutWindowBlocks: 0,
        };
        let receipt = IDelegationManager::new(contracts.delegation_manager, self.provider.clone())
            .registerAsOperator(details, String::new())
            .send()
            .await?
            .get_receipt()
            .await?;
        let core = settle("registerAsOperator", receipt)?;
        info!(block = ?core.block_number, "operator registered with delegation manager");

        let now = now_ms();
        let salt = registration_salt(operator, self.service_manager, now);
        let expiry = registration_expiry(now / 1000);

        let digest = IAVSDirectory::new(contracts.avs_directory, self.provider.clone())
            .calculateOperatorAVSRegistrationDigestHash(operator, self.service_manager, salt, expiry)
            .call()
            .await?;
        let signature = sign_avs_registration(&self.signer, digest, salt, expiry)?;

        let receipt = self
            .stake_registry_contract(contracts)
            .registerOperatorWithSignature(signature, operator)
            .send()
            .await?
            .get_receipt()
            .await?;
        let avs = settle("registerOperatorWithSignature", receipt)?;
        info!(block = ?avs.block_number, "operator registered with AVS stake registry");

        Ok(avs)
    }
}

/// Turn a mined receipt into a [`TxReceipt`], failing on revert.
fn settle(action: &'static str, receipt: TransactionReceipt) -> Result<TxReceipt, ChainError> {
    let tx_hash = receipt.transaction_hash();
    if !receipt.status() {
        return Err(ChainError::Reverted { action, tx_hash });
    }

    debug!(action, %tx_hash, block = ?receipt.block_number(), "transaction mined");

    Ok(TxReceipt {
        tx_hash,
        block_number: receipt.block_number(),
    })
}

#[async_trait]
impl ChainClient for EvmChainClient {
    fn operator(&self) -> Address {
        self.signer.address()
    }

    async fn is_operator_registered(&self) -> anyhow::Result<bool> {
        let registered = match &self.registration {
            Registration::HookRegistry => {
                self.registry_contract().isOperator(self.operator()).call().await?
            }
            Registration::EigenLayer(contracts) => {
                self.stake_registry_contract(contracts)
                    .operatorRegistered(self.operator())
                    .call()
                    .await?
            }
        };
        Ok(registered)
    }

    #[instrument(skip(self), level = "debug")]
    async fn register_operator(&self, stake: U256) -> anyhow::Result<TxReceipt> {
        if let Registration::EigenLayer(contracts) = &self.registration {
            if !stake.is_zero() {
                debug!(%stake, "stake is not sent on the EigenLayer registration path");
            }
            return self.register_with_eigenlayer(contracts).await;
        }

        let receipt = self
            .registry_contract()
            .registerOperator()
            .value(stake)
            .send()
            .await?
            .get_receipt()
            .await?;

        Ok(settle("registerOperator", receipt)?)
    }

    async fn sign_message(&self, digest: B256) -> anyhow::Result<Signature> {
        Ok(self.signer.sign_message(digest.as_slice()).await?)
    }

    #[instrument(skip(self, task, signature), fields(hook = %task.hook), level = "debug")]
    async fn respond_to_task(
        &self,
        task: &RiskTask,
        task_index: u32,
        score: RiskScore,
        signature: &Signature,
    ) -> anyhow::Result<TxReceipt> {
        let receipt = self
            .service_manager_contract()
            .respondToTask(
                task.into(),
                task_index,
                U256::from(score.value()),
                Bytes::copy_from_slice(&signature.as_bytes()),
            )
            .gas(RESPONSE_GAS_LIMIT)
            .send()
            .await?
            .get_receipt()
            .await?;

        Ok(settle("respondToTask", receipt)?)
    }

    #[instrument(skip(self), level = "debug")]
    async fn create_new_task(&self, hook: Address, pool_id: B256) -> anyhow::Result<TxReceipt> {
        let receipt = self
            .service_manager_contract()
            .createNewTask(hook, pool_id)
            .send()
            .await?
            .get_receipt()
            .await?;

        Ok(settle("createNewTask", receipt)?)
    }
}

#[async_trait]
impl TaskSource for EvmChainClient {
    async fn subscribe(&self) -> anyhow::Result<TaskStream> {
        let poller = self
            .service_manager_contract()
            .NewRiskTaskCreated_filter()
            .watch()
            .await?;

        info!(service_manager = %self.service_manager, "watching NewRiskTaskCreated");

        let stream = poller.into_stream().map(|item| -> anyhow::Result<TaskEvent> {
            let (event, _log) = item?;
            Ok(TaskEvent {
                task_index: event.taskIndex,
                task: RiskTask::from(event.task),
            })
        });

        Ok(stream.boxed())
    }
}
