//! Workflow-engine backend.
//!
//! Each spec is added to a `LaunchPad` as its own workflow. Unlike the function
//! executor there is no local future to poll: a handle answers "finished?" by
//! asking the engine for the workflow's launch state.

use super::types::*;
use crate::launchpad::{LaunchPad, WorkflowId, WorkflowState};

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct WorkflowBackend {
    launchpad: Arc<dyn LaunchPad>,
}

impl WorkflowBackend {
    pub fn new(launchpad: Arc<dyn LaunchPad>) -> Self {
        Self { launchpad }
    }
}

#[async_trait]
impl BackendAdapter for WorkflowBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Workflow
    }

    async fn submit(&self, spec: TaskSpec) -> Result<Box<dyn TaskHandle>, BackendError> {
        let fw_id = self
            .launchpad
            .add_workflow(spec)
            .await
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;

        Ok(Box::new(WorkflowHandle {
            launchpad: self.launchpad.clone(),
            fw_id,
            terminal: Mutex::new(None),
            consumed: false,
        }))
    }
}

pub struct WorkflowHandle {
    launchpad: Arc<dyn LaunchPad>,
    fw_id: WorkflowId,
    /// First terminal state the engine reported; the outcome is built from it.
    terminal: Mutex<Option<WorkflowState>>,
    consumed: bool,
}

impl WorkflowHandle {
    /// Asks the engine once. An id the engine does not know is final: it is
    /// recorded as a fizzle instead of being polled forever.
    async fn observe(&self) -> Option<WorkflowState> {
        match self.launchpad.workflow_state(self.fw_id).await {
            Ok(Some(state)) => state.is_terminal().then_some(state),
            Ok(None) => {
                tracing::warn!("Workflow {} is unknown to the engine", self.fw_id);
                Some(WorkflowState::Fizzled {
                    reason: format!("workflow {} is unknown to the engine", self.fw_id),
                })
            }
            Err(e) => {
                // Engine unreachable: try again on the next reconciliation pass.
                tracing::warn!("Could not query workflow {}: {}", self.fw_id, e);
                None
            }
        }
    }
}

#[async_trait]
impl TaskHandle for WorkflowHandle {
    async fn is_finished(&self) -> bool {
        let mut terminal = self.terminal.lock().await;
        if terminal.is_none() {
            *terminal = self.observe().await;
        }
        terminal.is_some()
    }

    async fn outcome(&mut self) -> Outcome {
        if self.consumed {
            return Outcome::failure("outcome already consumed");
        }

        let state = match self.terminal.get_mut().take() {
            Some(state) => state,
            None => match self.observe().await {
                Some(state) => state,
                None => {
                    return Outcome::failure(format!(
                        "workflow {} has not reached a terminal state",
                        self.fw_id
                    ))
                }
            },
        };
        self.consumed = true;

        match state {
            WorkflowState::Completed { record } => Outcome::Success(record),
            WorkflowState::Fizzled { reason } => Outcome::Failure { message: reason },
            other => Outcome::failure(format!(
                "workflow {} is not finished (state: {:?})",
                self.fw_id, other
            )),
        }
    }
}
