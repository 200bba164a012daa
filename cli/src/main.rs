pub mod cli;

use std::sync::Arc;

use anyhow::Context;
use chain::EvmChainClient;
use common::logger::init_logger;
use operator::config::GeneratorConfig;
use operator::generator::{create_metrics_task, run_task_generator};
use tracing::info;

use cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse_or_exit();

    let is_production = std::env::var("APP_ENV").unwrap_or_default() == "production";
    init_logger("create-metrics-tasks", is_production);

    let cfg = GeneratorConfig::from_env().context("failed to load generator configuration")?;
    let client = EvmChainClient::connect(
        &cfg.rpc_url,
        &cfg.private_key,
        cfg.registry_address,
        cfg.service_manager_address,
    )
    .context("failed to build chain client")?;

    if cli.once {
        create_metrics_task(&client, cli.hook_address).await?;
        return Ok(());
    }

    let every = cli.interval(cfg.check_interval);
    let created = run_task_generator(Arc::new(client), cli.hook_address, every, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await;

    info!(created, "Task generator exited");
    Ok(())
}
