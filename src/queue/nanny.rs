//! Queue Nanny
//!
//! Keeps every in-flight backend handle until it finishes, then reconciles it:
//! successful results are written to the result store, failures are filed as
//! diagnostics under the task's `TrackingId`.
//!
//! ## Concurrency
//! `tracked` and `errors` live behind one `tokio::sync::Mutex` that is only ever held
//! for map bookkeeping, never across a backend or store call. A reconciliation pass
//! copies the tracked handles out, asks each one (and the store) without the lock,
//! then re-takes it to move a finished entry out of `tracked` and, on failure, into
//! `errors` in one step. Until that step the entry is still reported as queued.
//! Passes are serialized by a second mutex so an outcome is consumed only once.

use super::types::*;
use crate::backend::types::{Outcome, ResultRecord, TaskHandle};
use crate::store::ResultStore;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Handles are only touched by the (serialized) reconciliation pass.
type SharedHandle = Arc<Mutex<Box<dyn TaskHandle>>>;

struct TrackedEntry {
    /// Namespace the task was submitted under; its result is stored there.
    namespace: String,
    handle: SharedHandle,
    tracked_at: Instant,
}

struct ErrorEntry {
    namespace: String,
    message: String,
}

#[derive(Default)]
struct NannyState {
    tracked: HashMap<TrackingId, TrackedEntry>,
    errors: HashMap<TrackingId, ErrorEntry>,
}

pub struct QueueNanny {
    state: Mutex<NannyState>,
    /// Held for a whole reconciliation or eviction pass.
    pass: Mutex<()>,
    store: Arc<dyn ResultStore>,
}

impl QueueNanny {
    pub fn new(store: Arc<dyn ResultStore>) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(NannyState::default()),
            pass: Mutex::new(()),
            store,
        })
    }

    /// Registers a handle and returns the identifier callers will poll with.
    pub async fn track(&self, namespace: &str, handle: Box<dyn TaskHandle>) -> TrackingId {
        let mut state = self.state.lock().await;

        let mut id = TrackingId::new();
        while state.tracked.contains_key(&id) || state.errors.contains_key(&id) {
            id = TrackingId::new();
        }

        state.tracked.insert(
            id.clone(),
            TrackedEntry {
                namespace: namespace.to_string(),
                handle: Arc::new(Mutex::new(handle)),
                tracked_at: Instant::now(),
            },
        );

        tracing::info!("Tracking task {} (namespace: {})", id, namespace);
        id
    }

    /// Reconciles every tracked handle that reports finished.
    ///
    /// Each finished handle's outcome is consumed exactly once and the entry leaves
    /// `tracked`. Handles that are still running are left for the next pass. A
    /// failure on one entry never stops the pass for the others.
    pub async fn reconcile(&self) -> ReconcileReport {
        let _pass = self.pass.lock().await;
        let mut report = ReconcileReport::default();

        let candidates: Vec<(TrackingId, String, SharedHandle)> = {
            let state = self.state.lock().await;
            state
                .tracked
                .iter()
                .map(|(id, entry)| (id.clone(), entry.namespace.clone(), entry.handle.clone()))
                .collect()
        };

        for (id, namespace, handle) in candidates {
            let outcome = {
                let mut handle = handle.lock().await;
                if !handle.is_finished().await {
                    tracing::trace!("Task {} still running", id);
                    continue;
                }
                handle.outcome().await
            };

            let result = match outcome {
                Outcome::Success(record) => self.persist(&namespace, record).await,
                Outcome::Failure { message } => Err(message),
            };

            let mut state = self.state.lock().await;
            if state.tracked.remove(&id).is_none() {
                continue;
            }
            match result {
                Ok(()) => report.stored += 1,
                Err(message) => {
                    tracing::warn!("Task {} failed: {}", id, message);
                    state.errors.insert(id, ErrorEntry { namespace, message });
                    report.failed += 1;
                }
            }
        }

        if !report.is_empty() {
            tracing::info!(
                "Reconciled {} task(s): {} stored, {} failed, {} still tracked",
                report.stored + report.failed,
                report.stored,
                report.failed,
                self.tracked_count().await
            );
        }

        report
    }

    /// Writes a successful result; any store-side problem becomes a diagnostic.
    async fn persist(&self, namespace: &str, record: ResultRecord) -> Result<(), String> {
        let label = format!("({}, {})", record.identity, record.method);

        match self.store.add_result(namespace, record).await {
            Ok(true) => {
                tracing::info!("Stored result {} in {}", label, namespace);
                Ok(())
            }
            Ok(false) => Err(format!("store rejected result for {}", label)),
            Err(e) => Err(format!("failed to store result for {}: {}", label, e)),
        }
    }

    /// Snapshot across all namespaces.
    pub async fn snapshot(&self) -> QueueSnapshot {
        let state = self.state.lock().await;
        build_snapshot(&state, |_| true)
    }

    /// Snapshot restricted to tasks submitted under `namespace`.
    pub async fn snapshot_namespace(&self, namespace: &str) -> QueueSnapshot {
        let state = self.state.lock().await;
        build_snapshot(&state, |ns| ns == namespace)
    }

    /// Drops the diagnostics filed under `namespace`, returning how many were removed.
    pub async fn clear_errors(&self, namespace: &str) -> usize {
        let mut state = self.state.lock().await;
        let before = state.errors.len();
        state.errors.retain(|_, entry| entry.namespace != namespace);
        let cleared = before - state.errors.len();

        if cleared > 0 {
            tracing::info!("Cleared {} error(s) in {}", cleared, namespace);
        }
        cleared
    }

    /// Evicts handles tracked for longer than `max_age` with a "stuck" diagnostic.
    ///
    /// A backend that loses a task would otherwise leave it tracked forever.
    pub async fn evict_stale(&self, max_age: Duration) -> usize {
        let _pass = self.pass.lock().await;
        let mut state = self.state.lock().await;

        let stale: Vec<TrackingId> = state
            .tracked
            .iter()
            .filter(|(_, entry)| entry.tracked_at.elapsed() >= max_age)
            .map(|(id, _)| id.clone())
            .collect();

        for id in &stale {
            if let Some(entry) = state.tracked.remove(id) {
                let message = format!(
                    "task exceeded {}s without finishing; evicted as stuck",
                    max_age.as_secs()
                );
                tracing::warn!("Task {}: {}", id, message);
                state.errors.insert(
                    id.clone(),
                    ErrorEntry {
                        namespace: entry.namespace,
                        message,
                    },
                );
            }
        }

        stale.len()
    }

    pub async fn tracked_count(&self) -> usize {
        self.state.lock().await.tracked.len()
    }

    pub async fn error_count(&self) -> usize {
        self.state.lock().await.errors.len()
    }

    /// Spawns the periodic reconciliation loop.
    ///
    /// When `stale_after` is set, the loop also evicts handles older than that.
    pub fn spawn_reconciler(
        self: Arc<Self>,
        interval: Duration,
        stale_after: Option<Duration>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!("Reconciler running every {:?}", interval);
            let mut ticker = tokio::time::interval(interval);

            loop {
                ticker.tick().await;
                self.reconcile().await;

                if let Some(max_age) = stale_after {
                    let evicted = self.evict_stale(max_age).await;
                    if evicted > 0 {
                        tracing::warn!("Evicted {} stuck task(s)", evicted);
                    }
                }
            }
        })
    }
}

fn build_snapshot(state: &NannyState, include: impl Fn(&str) -> bool) -> QueueSnapshot {
    let mut tracked: Vec<(&TrackingId, &TrackedEntry)> = state
        .tracked
        .iter()
        .filter(|(_, entry)| include(&entry.namespace))
        .collect();
    tracked.sort_by_key(|(_, entry)| entry.tracked_at);

    QueueSnapshot {
        queue: tracked.into_iter().map(|(id, _)| id.clone()).collect(),
        errors: state
            .errors
            .iter()
            .filter(|(_, entry)| include(&entry.namespace))
            .map(|(id, entry)| (id.clone(), entry.message.clone()))
            .collect(),
    }
}
