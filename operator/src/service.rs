//! Operator service: registration, subscription and lifecycle.

use std::sync::Arc;

use chain::{ChainClient, TaskSource, U256};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::{DEFAULT_TASK_QUEUE_CAPACITY, OperatorConfig, SubmitPolicy};
use crate::counters::Counters;
use crate::dispatch::{PumpExit, dispatch_tasks, pump_tasks};
use crate::error::OperatorError;
use crate::handler::TaskHandler;
use crate::metrics_provider::MetricsProvider;
use crate::state::{Lifecycle, OperatorState};

/// Subset of [`OperatorConfig`] the service itself needs.
#[derive(Clone, Debug)]
pub struct ServiceSettings {
    pub stake_amount: U256,
    pub task_queue_capacity: usize,
    pub submit: SubmitPolicy,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            stake_amount: U256::ZERO,
            task_queue_capacity: DEFAULT_TASK_QUEUE_CAPACITY,
            submit: SubmitPolicy::default(),
        }
    }
}

impl From<&OperatorConfig> for ServiceSettings {
    fn from(cfg: &OperatorConfig) -> Self {
        Self {
            stake_amount: cfg.stake_amount,
            task_queue_capacity: cfg.task_queue_capacity,
            submit: cfg.submit,
        }
    }
}

pub struct RiskService<C, S, M>
where
    C: ChainClient,
    S: TaskSource,
    M: MetricsProvider,
{
    settings: ServiceSettings,
    chain: Arc<C>,
    source: Arc<S>,
    handler: Arc<TaskHandler<C, M>>,
    lifecycle: Arc<Lifecycle>,
    counters: Counters,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    start_lock: tokio::sync::Mutex<()>,
}

impl<C, S, M> RiskService<C, S, M>
where
    C: ChainClient,
    S: TaskSource,
    M: MetricsProvider,
{
    pub fn new(settings: ServiceSettings, chain: Arc<C>, source: Arc<S>, metrics: Arc<M>) -> Self {
        let counters = Counters::default();
        let handler = Arc::new(TaskHandler::new(
            chain.clone(),
            metrics,
            settings.submit,
            counters.clone(),
        ));

        Self {
            settings,
            chain,
            source,
            handler,
            lifecycle: Arc::new(Lifecycle::new()),
            counters,
            tasks: Mutex::new(Vec::new()),
            start_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn state(&self) -> OperatorState {
        self.lifecycle.current()
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    /// Register if needed, subscribe to new tasks and go `Active`.
    ///
    /// Only valid from `Starting`. A registration or subscription failure moves
    /// the service to `Error` and is returned. If the subscription later ends on
    /// its own the service also moves to `Error`.
    pub async fn start(&self) -> Result<(), OperatorError> {
        // Held across registration and subscription so overlapping calls
        // cannot both build a pipeline.
        let _claim = self.start_lock.lock().await;

        let current = self.lifecycle.current();
        if !current.can_transition_to(OperatorState::Active) {
            return Err(OperatorError::InvalidTransition {
                from: current,
                to: OperatorState::Active,
            });
        }

        info!(
            component = "service",
            event = "startup",
            operator = %self.chain.operator(),
            "Starting risk operator"
        );

        if let Err(e) = self.ensure_registered().await {
            self.lifecycle.fail();
            error!(component = "service", error = %format!("{e:#}"), "Operator registration failed");
            return Err(OperatorError::Registration(e));
        }

        let stream = match self.source.subscribe().await {
            Ok(stream) => stream,
            Err(e) => {
                self.lifecycle.fail();
                error!(component = "service", error = %format!("{e:#}"), "Task subscription failed");
                return Err(OperatorError::Subscription(e));
            }
        };

        self.lifecycle.transition(OperatorState::Active)?;

        let (tx, rx) = mpsc::channel(self.settings.task_queue_capacity);
        let lifecycle = self.lifecycle.clone();
        let pump = tokio::spawn(async move {
            if pump_tasks(stream, tx).await == PumpExit::StreamEnded {
                let from = lifecycle.fail();
                error!(
                    component = "service",
                    event = "subscription_lost",
                    %from,
                    "Task subscription ended; no further tasks will be received"
                );
            }
        });
        let dispatcher = tokio::spawn(dispatch_tasks(
            rx,
            self.handler.clone(),
            self.counters.clone(),
        ));
        self.tasks.lock().extend([pump, dispatcher]);

        info!(component = "service", state = %OperatorState::Active, "Risk operator active");

        Ok(())
    }

    /// Stop consuming tasks and abort in-flight handlers.
    ///
    /// `Active` moves to `Paused`; from any other state the background work is
    /// torn down and the state is left as is.
    pub async fn stop(&self) {
        let handles: Vec<_> = self.tasks.lock().drain(..).collect();
        for handle in &handles {
            handle.abort();
        }
        for handle in handles {
            if let Err(e) = handle.await
                && !e.is_cancelled()
            {
                warn!(component = "service", error = %e, "Background task failed before shutdown");
            }
        }

        match self.lifecycle.transition(OperatorState::Paused) {
            Ok(_) => info!(component = "service", event = "shutdown", "Risk operator paused"),
            Err(e) => warn!(component = "service", error = %e, "Stopped without pausing"),
        }
    }

    async fn ensure_registered(&self) -> anyhow::Result<()> {
        if self.chain.is_operator_registered().await? {
            info!(component = "service", "Operator already registered");
            return Ok(());
        }

        info!(
            component = "service",
            stake = %self.settings.stake_amount,
            "Registering operator"
        );
        let receipt = self
            .chain
            .register_operator(self.settings.stake_amount)
            .await?;
        info!(
            component = "service",
            event = "registered",
            tx_hash = %receipt.tx_hash,
            "Operator registered"
        );

        Ok(())
    }
}
