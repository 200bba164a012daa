//! Metrics task generator.
//!
//! Periodically asks the service manager to open a new risk task for one hook.
//! The task's pool id is derived from a unique name, so every tick produces a
//! distinct task.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chain::digest::{metrics_task_name, metrics_task_pool_id};
use chain::{Address, ChainClient, TxReceipt};
use common::time::now_ms;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{error, info};

/// A task opened by the generator.
#[derive(Clone, Debug)]
pub struct CreatedTask {
    pub name: String,
    pub receipt: TxReceipt,
}

/// Open one metrics task for `hook`.
pub async fn create_metrics_task<C>(chain: &C, hook: Address) -> anyhow::Result<CreatedTask>
where
    C: ChainClient + ?Sized,
{
    let name = metrics_task_name(hook, now_ms());
    let pool_id = metrics_task_pool_id(&name);

    let receipt = chain
        .create_new_task(hook, pool_id)
        .await
        .with_context(|| format!("failed to create task {name}"))?;

    info!(
        component = "generator",
        event = "task_created",
        task = %name,
        tx_hash = %receipt.tx_hash,
        "Metrics task created"
    );

    Ok(CreatedTask { name, receipt })
}

/// Create a task every `every` until `shutdown` resolves.
///
/// The first task is created one period after start. A failed tick is logged
/// and the loop keeps going. Returns the number of tasks created.
pub async fn run_task_generator<C, F>(
    chain: Arc<C>,
    hook: Address,
    every: Duration,
    shutdown: F,
) -> u64
where
    C: ChainClient,
    F: Future<Output = ()>,
{
    let mut ticker = interval_at(Instant::now() + every, every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    info!(
        component = "generator",
        event = "startup",
        hook = %hook,
        every_ms = every.as_millis() as u64,
        "Task generator started"
    );

    let mut created = 0;
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {
                match create_metrics_task(chain.as_ref(), hook).await {
                    Ok(_) => created += 1,
                    Err(e) => error!(
                        component = "generator",
                        event = "create_failure",
                        error = %format!("{e:#}"),
                        "Failed to create metrics task"
                    ),
                }
            }
        }
    }

    info!(component = "generator", event = "shutdown", created, "Task generator stopped");
    created
}
