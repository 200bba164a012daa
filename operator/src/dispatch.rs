//! Work delivery between the task subscription and the handlers.
//!
//! ```text
//! TaskStream --pump--> mpsc (bounded) --dispatcher--> one spawned handler per task
//! ```
//!
//! The pump never handles tasks and the dispatcher never touches the chain
//! subscription. A delivery whose task index is already in flight is dropped;
//! the index is released however its handler ends, panics included.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use chain::{ChainClient, TaskEvent, TaskStream};
use common::logger::{TraceId, root_span};
use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::task::{JoinError, JoinSet};
use tracing::{Instrument, debug, error, info, warn};

use crate::counters::Counters;
use crate::handler::TaskHandler;
use crate::metrics_provider::MetricsProvider;

/// Why [`pump_tasks`] returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PumpExit {
    /// The subscription stream ended; no further tasks will arrive.
    StreamEnded,
    /// The dispatcher dropped its receiver.
    DispatcherGone,
}

/// Forward decoded task events into the dispatcher queue.
///
/// Undecodable deliveries are logged and skipped.
pub async fn pump_tasks(mut stream: TaskStream, tx: Sender<TaskEvent>) -> PumpExit {
    while let Some(item) = stream.next().await {
        match item {
            Ok(event) => {
                if tx.send(event).await.is_err() {
                    warn!(
                        component = "pump",
                        event = "dispatcher_gone",
                        "Dispatcher channel closed"
                    );
                    return PumpExit::DispatcherGone;
                }
            }
            Err(e) => {
                warn!(
                    component = "pump",
                    event = "decode_failure",
                    error = %format!("{e:#}"),
                    "Skipping undecodable task delivery"
                );
            }
        }
    }

    warn!(component = "pump", event = "shutdown", "Task subscription ended");
    PumpExit::StreamEnded
}

/// Spawn one handler per received task.
///
/// Handlers run inside a [`JoinSet`], so aborting the dispatcher aborts every
/// in-flight handler with it.
pub async fn dispatch_tasks<C, M>(
    mut rx: Receiver<TaskEvent>,
    handler: Arc<TaskHandler<C, M>>,
    counters: Counters,
) where
    C: ChainClient,
    M: MetricsProvider,
{
    info!(component = "dispatcher", event = "startup", "Task dispatcher started");

    let in_flight: Arc<Mutex<HashSet<u32>>> = Arc::default();
    let mut running = JoinSet::new();

    loop {
        tokio::select! {
            received = rx.recv() => {
                let Some(event) = received else { break };
                counters.tasks_received.fetch_add(1, Ordering::Relaxed);

                if !in_flight.lock().insert(event.task_index) {
                    counters.tasks_duplicate.fetch_add(1, Ordering::Relaxed);
                    debug!(
                        component = "dispatcher",
                        task_index = event.task_index,
                        "Task already in flight; dropping duplicate delivery"
                    );
                    continue;
                }

                running.spawn(run_one(
                    event,
                    handler.clone(),
                    counters.clone(),
                    in_flight.clone(),
                ));
            }
            Some(joined) = running.join_next(), if !running.is_empty() => {
                record_join(joined, &counters);
            }
        }
    }

    // Queue closed: let the handlers already started finish.
    while let Some(joined) = running.join_next().await {
        record_join(joined, &counters);
    }

    warn!(component = "dispatcher", event = "shutdown", "Task queue closed");
}

/// A panicked handler never reaches its own failure accounting.
fn record_join(joined: Result<(), JoinError>, counters: &Counters) {
    if let Err(e) = joined
        && e.is_panic()
    {
        counters.tasks_failed.fetch_add(1, Ordering::Relaxed);
        error!(component = "dispatcher", event = "handler_panic", error = %e, "Task handler panicked");
    }
}

/// Releases a task index when the handler finishes, unwinds or is aborted.
struct InFlightGuard {
    in_flight: Arc<Mutex<HashSet<u32>>>,
    task_index: u32,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight.lock().remove(&self.task_index);
    }
}

async fn run_one<C, M>(
    event: TaskEvent,
    handler: Arc<TaskHandler<C, M>>,
    counters: Counters,
    in_flight: Arc<Mutex<HashSet<u32>>>,
) where
    C: ChainClient,
    M: MetricsProvider,
{
    let _guard = InFlightGuard {
        in_flight,
        task_index: event.task_index,
    };

    let trace_id = TraceId::new();
    let span = root_span("risk_task", &trace_id);
    span.record("task_index", event.task_index);

    async {
        info!(
            component = "dispatcher",
            task_index = event.task_index,
            hook = %event.task.hook,
            pool_id = %event.task.pool_id,
            "Processing task"
        );

        match handler.handle(&event).await {
            Ok(_) => {
                counters.tasks_succeeded.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                counters.tasks_failed.fetch_add(1, Ordering::Relaxed);
                error!(
                    component = "dispatcher",
                    event = "task_failed",
                    task_index = event.task_index,
                    error = %e,
                    "Task handling failed"
                );
            }
        }
    }
    .instrument(span)
    .await;
}
