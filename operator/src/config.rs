use std::str::FromStr;
use std::time::Duration;

use chain::{Address, EigenLayerContracts, Registration, U256};

use crate::error::ConfigError;

/// Bounded retry for task submissions.
///
/// `max_attempts = 1` disables retry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubmitPolicy {
    pub max_attempts: u32,

    /// Delay before the first retry; doubled after every further failure.
    pub backoff: Duration,
}

impl Default for SubmitPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::from_millis(500),
        }
    }
}

/// Operator process configuration.
///
/// Built once at startup and handed to whoever needs it; never mutated afterwards.
#[derive(Clone)]
pub struct OperatorConfig {
    /// JSON-RPC endpoint.
    pub rpc_url: String,

    /// Hex-encoded operator key. Redacted from `Debug`.
    pub private_key: String,

    pub registry_address: Address,
    pub service_manager_address: Address,

    /// Vault contract. Only recorded and logged.
    pub vault_address: Address,

    /// Wei sent along with `registerOperator`.
    pub stake_amount: U256,

    /// Set when all three EigenLayer addresses are configured; registration
    /// then goes through the delegation manager and AVS stake registry.
    pub eigenlayer: Option<EigenLayerContracts>,

    /// Period of the task generator.
    pub check_interval: Duration,

    /// Capacity of the subscription -> dispatcher channel.
    ///
    /// Acts as backpressure: a slow dispatcher stalls the subscription pump
    /// instead of growing memory.
    pub task_queue_capacity: usize,

    pub submit: SubmitPolicy,
}

impl std::fmt::Debug for OperatorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperatorConfig")
            .field("rpc_url", &self.rpc_url)
            .field("private_key", &"<redacted>")
            .field("registry_address", &self.registry_address)
            .field("service_manager_address", &self.service_manager_address)
            .field("vault_address", &self.vault_address)
            .field("stake_amount", &self.stake_amount)
            .field("eigenlayer", &self.eigenlayer)
            .field("check_interval", &self.check_interval)
            .field("task_queue_capacity", &self.task_queue_capacity)
            .field("submit", &self.submit)
            .finish()
    }
}

pub const DEFAULT_CHECK_INTERVAL_MS: u64 = 24_000;
pub const DEFAULT_TASK_QUEUE_CAPACITY: usize = 256;

impl OperatorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production, a map in tests).
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_attempts: u32 = parse_or(&get, "SUBMIT_MAX_ATTEMPTS", 1)?;
        if max_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "SUBMIT_MAX_ATTEMPTS",
                reason: "must be at least 1".into(),
            });
        }

        let task_queue_capacity = parse_or(&get, "TASK_QUEUE_CAPACITY", DEFAULT_TASK_QUEUE_CAPACITY)?;
        if task_queue_capacity == 0 {
            return Err(ConfigError::Invalid {
                key: "TASK_QUEUE_CAPACITY",
                reason: "must be at least 1".into(),
            });
        }

        Ok(Self {
            rpc_url: required(&get, "RPC_URL")?,
            private_key: required(&get, "PRIVATE_KEY")?,
            registry_address: address(&get, "REGISTRY_ADDRESS")?,
            service_manager_address: address(&get, "SERVICE_MANAGER_ADDRESS")?,
            vault_address: address(&get, "VAULT_ADDRESS")?,
            stake_amount: parse_or(&get, "STAKE_AMOUNT", U256::ZERO)?,
            eigenlayer: eigenlayer(&get)?,
            check_interval: check_interval(&get)?,
            task_queue_capacity,
            submit: SubmitPolicy {
                max_attempts,
                backoff: Duration::from_millis(parse_or(&get, "SUBMIT_BACKOFF_MS", 500)?),
            },
        })
    }
}

impl OperatorConfig {
    pub fn registration(&self) -> Registration {
        match self.eigenlayer {
            Some(contracts) => Registration::EigenLayer(contracts),
            None => Registration::HookRegistry,
        }
    }
}

/// Settings for the task generator binary. Registration is not its concern,
/// so only the service manager address is required.
#[derive(Clone)]
pub struct GeneratorConfig {
    pub rpc_url: String,
    pub private_key: String,

    /// Optional; defaults to the zero address.
    pub registry_address: Address,

    pub service_manager_address: Address,
    pub check_interval: Duration,
}

impl std::fmt::Debug for GeneratorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorConfig")
            .field("rpc_url", &self.rpc_url)
            .field("private_key", &"<redacted>")
            .field("service_manager_address", &self.service_manager_address)
            .field("check_interval", &self.check_interval)
            .finish()
    }
}

impl GeneratorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let registry_address = match get("REGISTRY_ADDRESS") {
            Some(_) => address(&get, "REGISTRY_ADDRESS")?,
            None => Address::ZERO,
        };

        Ok(Self {
            rpc_url: required(&get, "RPC_URL")?,
            private_key: required(&get, "PRIVATE_KEY")?,
            registry_address,
            service_manager_address: address(&get, "SERVICE_MANAGER_ADDRESS")?,
            check_interval: check_interval(&get)?,
        })
    }
}

fn required<F>(get: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ConfigError::Missing(key)),
    }
}

fn address<F>(get: &F, key: &'static str) -> Result<Address, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = required(get, key)?;
    raw.parse().map_err(|e| ConfigError::Invalid {
        key,
        reason: format!("{raw:?} is not an address: {e}"),
    })
}

const EIGENLAYER_KEYS: [&str; 3] = [
    "DELEGATION_MANAGER_ADDRESS",
    "AVS_DIRECTORY_ADDRESS",
    "STAKE_REGISTRY_ADDRESS",
];

/// All three addresses or none.
fn eigenlayer<F>(get: &F) -> Result<Option<EigenLayerContracts>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let present = EIGENLAYER_KEYS
        .iter()
        .filter(|key| get(key).is_some_and(|v| !v.trim().is_empty()))
        .count();

    match present {
        0 => Ok(None),
        3 => Ok(Some(EigenLayerContracts {
            delegation_manager: address(get, "DELEGATION_MANAGER_ADDRESS")?,
            avs_directory: address(get, "AVS_DIRECTORY_ADDRESS")?,
            stake_registry: address(get, "STAKE_REGISTRY_ADDRESS")?,
        })),
        _ => Err(ConfigError::Invalid {
            key: "DELEGATION_MANAGER_ADDRESS",
            reason: "DELEGATION_MANAGER_ADDRESS, AVS_DIRECTORY_ADDRESS and STAKE_REGISTRY_ADDRESS must be set together".into(),
        }),
    }
}

fn parse_or<F, T>(get: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: format!("{raw:?}: {e}"),
        }),
    }
}

fn check_interval<F>(get: &F) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let ms: u64 = parse_or(get, "CHECK_INTERVAL", DEFAULT_CHECK_INTERVAL_MS)?;
    if ms == 0 {
        return Err(ConfigError::Invalid {
            key: "CHECK_INTERVAL",
            reason: "must be greater than zero".into(),
        });
    }
    Ok(Duration::from_millis(ms))
}
