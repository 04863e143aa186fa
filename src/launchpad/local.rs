//! In-process Workflow Engine
//!
//! Stores workflows in memory and runs them on a pool of rocket workers.
//!
//! ## Responsibilities
//! - **Launching**: assigning ids and storing added workflows as `Waiting`.
//! - **Claiming**: a worker atomically moves a workflow from `Waiting` to `Running`,
//!   so two workers never run the same workflow.
//! - **Execution**: running the spec through the `ComputeRegistry` and recording
//!   `Completed` or `Fizzled`.

use super::types::*;
use crate::backend::registry::ComputeRegistry;
use crate::backend::types::{Outcome, TaskSpec};

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub struct LocalLaunchPad {
    workflows: DashMap<WorkflowId, WorkflowEntry>,
    next_id: AtomicU64,
    registry: Arc<ComputeRegistry>,
    worker_count: usize,
}

impl LocalLaunchPad {
    pub fn new(registry: Arc<ComputeRegistry>, worker_count: usize) -> Arc<Self> {
        Arc::new(Self {
            workflows: DashMap::new(),
            next_id: AtomicU64::new(1),
            registry,
            worker_count: worker_count.max(1),
        })
    }

    /// Spawns the rocket workers and returns immediately.
    pub fn start(self: Arc<Self>) {
        tracing::info!("Starting {} rocket workers", self.worker_count);

        for worker_id in 0..self.worker_count {
            let launchpad = self.clone();
            tokio::spawn(async move {
                launchpad.rocket_loop(worker_id).await;
            });
        }
    }

    async fn rocket_loop(&self, worker_id: usize) {
        tracing::debug!("Rocket worker {} started", worker_id);

        loop {
            let waiting = self.waiting_workflows();

            if waiting.is_empty() {
                tokio::time::sleep(Duration::from_millis(100)).await;
                continue;
            }

            let mut claimed = false;
            for id in waiting {
                if let Some(spec) = self.try_claim(id) {
                    tracing::info!("Rocket worker {} launched workflow {}", worker_id, id);
                    self.run_workflow(id, spec).await;
                    claimed = true;
                    break;
                }
            }

            // Every candidate was taken by another worker.
            if !claimed {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        }
    }

    async fn run_workflow(&self, id: WorkflowId, spec: TaskSpec) {
        let result = self.registry.execute(spec.clone()).await;

        match Outcome::from_compute(&spec, result) {
            Outcome::Success(record) => self.complete(id, WorkflowState::Completed { record }),
            Outcome::Failure { message } => {
                tracing::warn!("Workflow {} fizzled: {}", id, message);
                self.complete(id, WorkflowState::Fizzled { reason: message })
            }
        }
    }

    /// Ids of all workflows still waiting for a worker, oldest first.
    pub fn waiting_workflows(&self) -> Vec<WorkflowId> {
        let mut waiting: Vec<WorkflowId> = self
            .workflows
            .iter()
            .filter(|entry| entry.value().state == WorkflowState::Waiting)
            .map(|entry| *entry.key())
            .collect();
        // Ids are handed out in insertion order.
        waiting.sort_by_key(|id| id.0);
        waiting
    }

    /// Moves a workflow from `Waiting` to `Running`.
    ///
    /// Returns the spec to run, or `None` if another worker already claimed it.
    pub fn try_claim(&self, id: WorkflowId) -> Option<TaskSpec> {
        let mut entry = self.workflows.get_mut(&id)?;
        if entry.state != WorkflowState::Waiting {
            return None;
        }
        entry.state = WorkflowState::Running;
        tracing::debug!("Claimed workflow {}", id);
        Some(entry.spec.clone())
    }

    pub fn complete(&self, id: WorkflowId, state: WorkflowState) {
        match self.workflows.get_mut(&id) {
            Some(mut entry) => entry.state = state,
            None => tracing::warn!("Completed unknown workflow {}", id),
        }
    }

    pub fn get(&self, id: WorkflowId) -> Option<WorkflowEntry> {
        self.workflows.get(&id).map(|entry| entry.value().clone())
    }

    pub fn workflow_count(&self) -> usize {
        self.workflows.len()
    }

    /// `(waiting, running, completed, fizzled)`
    pub fn state_counts(&self) -> (usize, usize, usize, usize) {
        let mut counts = (0, 0, 0, 0);
        for entry in self.workflows.iter() {
            match entry.value().state {
                WorkflowState::Waiting => counts.0 += 1,
                WorkflowState::Running => counts.1 += 1,
                WorkflowState::Completed { .. } => counts.2 += 1,
                WorkflowState::Fizzled { .. } => counts.3 += 1,
            }
        }
        counts
    }
}

#[async_trait]
impl LaunchPad for LocalLaunchPad {
    async fn add_workflow(&self, spec: TaskSpec) -> Result<WorkflowId> {
        let id = WorkflowId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.workflows.insert(
            id,
            WorkflowEntry {
                spec,
                state: WorkflowState::Waiting,
            },
        );
        tracing::info!("Added workflow {}", id);
        Ok(id)
    }

    async fn workflow_state(&self, id: WorkflowId) -> Result<Option<WorkflowState>> {
        Ok(self
            .workflows
            .get(&id)
            .map(|entry| entry.value().state.clone()))
    }
}
