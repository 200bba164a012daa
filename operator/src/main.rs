use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chain::EvmChainClient;
use common::logger::init_logger;
use operator::config::OperatorConfig;
use operator::metrics_provider::StaticMetricsProvider;
use operator::service::{RiskService, ServiceSettings};
use operator::state::OperatorState;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let is_production = std::env::var("APP_ENV").unwrap_or_default() == "production";
    init_logger("risk-operator", is_production);

    let cfg = OperatorConfig::from_env().context("failed to load operator configuration")?;
    info!(
        rpc_url = %cfg.rpc_url,
        registry = %cfg.registry_address,
        service_manager = %cfg.service_manager_address,
        vault = %cfg.vault_address,
        registration = ?cfg.registration(),
        "Configuration loaded"
    );

    let client = Arc::new(
        EvmChainClient::connect(
            &cfg.rpc_url,
            &cfg.private_key,
            cfg.registry_address,
            cfg.service_manager_address,
        )
        .context("failed to build chain client")?
        .with_registration(cfg.registration()),
    );

    let service = RiskService::new(
        ServiceSettings::from(&cfg),
        client.clone(),
        client,
        Arc::new(StaticMetricsProvider::default()),
    );

    service.start().await.context("failed to start risk service")?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut health = tokio::time::interval(Duration::from_secs(1));
    let failed = loop {
        tokio::select! {
            signal = &mut ctrl_c => {
                signal?;
                info!("Shutting down...");
                break false;
            }
            _ = health.tick() => {
                if service.state() == OperatorState::Error {
                    error!("Risk service entered ERROR state; exiting");
                    break true;
                }
            }
        }
    };

    service.stop().await;

    let c = service.counters().snapshot();
    info!(
        received = c.tasks_received,
        succeeded = c.tasks_succeeded,
        failed = c.tasks_failed,
        duplicate = c.tasks_duplicate,
        anomalies = c.anomalies_flagged,
        "Final task counters"
    );

    if failed {
        anyhow::bail!("risk service failed");
    }
    Ok(())
}
