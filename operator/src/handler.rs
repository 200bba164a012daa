//! Per-task pipeline: collect -> validate -> score -> sign -> submit.
//!
//! A handler owns no lifecycle state. Every failure is returned as a
//! [`TaskError`] and the caller decides what to do with it.

use std::sync::Arc;
use std::time::Duration;

use chain::digest::response_digest;
use chain::{ChainClient, SignedResponse, TaskEvent, TxReceipt};
use common::logger::{child_span, warn_if_slow};
use common::time::now_ms;
use tracing::{Instrument, debug, info, warn};

use crate::config::SubmitPolicy;
use crate::counters::Counters;
use crate::error::TaskError;
use crate::metrics_provider::MetricsProvider;

const SLOW_SUBMIT: Duration = Duration::from_secs(10);

/// Result of one successfully handled task.
#[derive(Clone, Debug)]
pub struct TaskOutcome {
    pub response: SignedResponse,
    pub receipt: TxReceipt,
}

pub struct TaskHandler<C: ChainClient, M: MetricsProvider> {
    chain: Arc<C>,
    metrics: Arc<M>,
    submit: SubmitPolicy,
    counters: Counters,
}

impl<C: ChainClient, M: MetricsProvider> TaskHandler<C, M> {
    pub fn new(chain: Arc<C>, metrics: Arc<M>, submit: SubmitPolicy, counters: Counters) -> Self {
        Self {
            chain,
            metrics,
            submit,
            counters,
        }
    }

    pub async fn handle(&self, event: &TaskEvent) -> Result<TaskOutcome, TaskError> {
        let task_index = event.task_index;

        let metrics = self
            .metrics
            .collect(&event.task)
            .instrument(child_span("collect_metrics"))
            .await
            .map_err(TaskError::Metrics)?;
        metrics
            .validate()
            .map_err(|e| TaskError::Metrics(e.into()))?;

        let assessment = risk::assess(&metrics);

        debug!(
            component = "handler",
            task_index,
            volume = assessment.normalized.volume,
            tvl = assessment.normalized.tvl,
            price_impact = assessment.normalized.price_impact,
            swap_count = assessment.normalized.swap_count,
            failure_rate = assessment.normalized.failure_rate,
            "normalized metrics"
        );

        if !assessment.anomalies.is_empty() {
            self.counters.anomalies_flagged.fetch_add(
                assessment.anomalies.len() as u64,
                std::sync::atomic::Ordering::Relaxed,
            );

            let flags: Vec<&str> = assessment.anomalies.iter().map(|f| f.as_str()).collect();
            warn!(
                component = "handler",
                event = "anomalies",
                task_index,
                hook = %event.task.hook,
                flags = ?flags,
                "Anomalies detected"
            );
        }

        let digest = response_digest(&event.task, assessment.score, &metrics)?;
        let signature = self
            .chain
            .sign_message(digest)
            .await
            .map_err(TaskError::Signing)?;

        let response = SignedResponse {
            task_index,
            metrics,
            risk_score: assessment.score,
            anomalies: assessment.anomalies,
            digest,
            signature,
            timestamp_ms: now_ms(),
        };

        let receipt = self
            .submit(event, &response)
            .instrument(child_span("submit_response"))
            .await?;

        info!(
            component = "handler",
            event = "responded",
            task_index,
            risk_score = %response.risk_score,
            tx_hash = %receipt.tx_hash,
            "Task response submitted"
        );

        Ok(TaskOutcome { response, receipt })
    }

    /// `respondToTask` with bounded retry. Backoff doubles after every failed attempt.
    async fn submit(
        &self,
        event: &TaskEvent,
        response: &SignedResponse,
    ) -> Result<TxReceipt, TaskError> {
        let mut backoff = self.submit.backoff;
        let mut attempt = 0;

        loop {
            attempt += 1;

            let result = warn_if_slow(
                "respond_to_task",
                SLOW_SUBMIT,
                self.chain.respond_to_task(
                    &event.task,
                    event.task_index,
                    response.risk_score,
                    &response.signature,
                ),
            )
            .await;

            match result {
                Ok(receipt) => return Ok(receipt),
                Err(e) if attempt < self.submit.max_attempts => {
                    warn!(
                        component = "handler",
                        event = "submit_retry",
                        task_index = event.task_index,
                        attempt,
                        error = %format!("{e:#}"),
                        "Submission failed; retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = backoff.saturating_mul(2);
                }
                Err(e) => {
                    return Err(TaskError::Submission {
                        attempts: attempt,
                        last_error: e,
                    });
                }
            }
        }
    }
}
