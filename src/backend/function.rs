//! Distributed-function executor backend.
//!
//! Each submitted spec becomes a future on the tokio worker pool. Concurrency is
//! bounded by a semaphore so a large batch queues up instead of running all at once.

use super::registry::ComputeRegistry;
use super::types::*;

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

pub struct FunctionBackend {
    registry: Arc<ComputeRegistry>,
    permits: Arc<Semaphore>,
}

impl FunctionBackend {
    /// Creates a backend running at most `workers` computations at a time.
    pub fn new(registry: Arc<ComputeRegistry>, workers: usize) -> Self {
        Self {
            registry,
            permits: Arc::new(Semaphore::new(workers.max(1))),
        }
    }
}

#[async_trait]
impl BackendAdapter for FunctionBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Function
    }

    async fn submit(&self, spec: TaskSpec) -> Result<Box<dyn TaskHandle>, BackendError> {
        let registry = self.registry.clone();
        let permits = self.permits.clone();

        tracing::debug!(
            "Submitting ({}, {}) to function executor",
            spec.identity,
            spec.method
        );

        let join = tokio::spawn(async move {
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return Outcome::failure("function executor is shut down"),
            };
            let result = registry.execute(spec.clone()).await;
            Outcome::from_compute(&spec, result)
        });

        Ok(Box::new(FutureHandle { join: Some(join) }))
    }
}

/// Handle over a spawned computation.
pub struct FutureHandle {
    join: Option<JoinHandle<Outcome>>,
}

#[async_trait]
impl TaskHandle for FutureHandle {
    async fn is_finished(&self) -> bool {
        self.join.as_ref().map(|j| j.is_finished()).unwrap_or(true)
    }

    async fn outcome(&mut self) -> Outcome {
        let Some(join) = self.join.take() else {
            return Outcome::failure("outcome already consumed");
        };

        match join.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_panic() => Outcome::failure(format!("compute worker panicked: {}", e)),
            Err(e) => Outcome::failure(format!("compute worker cancelled: {}", e)),
        }
    }
}
