use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Minimal counters for operational visibility.
#[derive(Clone, Default, Debug)]
pub struct Counters {
    pub tasks_received: Arc<AtomicU64>,
    pub tasks_succeeded: Arc<AtomicU64>,
    pub tasks_failed: Arc<AtomicU64>,

    // deliveries dropped because the same task index was already in flight
    pub tasks_duplicate: Arc<AtomicU64>,

    pub anomalies_flagged: Arc<AtomicU64>,
}

/// Point-in-time copy of [`Counters`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub tasks_received: u64,
    pub tasks_succeeded: u64,
    pub tasks_failed: u64,
    pub tasks_duplicate: u64,
    pub anomalies_flagged: u64,
}

impl Counters {
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            tasks_received: self.tasks_received.load(Ordering::Relaxed),
            tasks_succeeded: self.tasks_succeeded.load(Ordering::Relaxed),
            tasks_failed: self.tasks_failed.load(Ordering::Relaxed),
            tasks_duplicate: self.tasks_duplicate.load(Ordering::Relaxed),
            anomalies_flagged: self.anomalies_flagged.load(Ordering::Relaxed),
        }
    }
}
