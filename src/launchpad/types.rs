use crate::backend::types::{ResultRecord, TaskSpec};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier the workflow engine assigns to an added workflow.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct WorkflowId(pub u64);

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fw-{}", self.0)
    }
}

/// Launch state of a workflow as reported by the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WorkflowState {
    /// Added, waiting for a rocket worker to pick it up.
    Waiting,
    /// Claimed by a rocket worker.
    Running,
    Completed { record: ResultRecord },
    /// Execution failed; the engine keeps the reason.
    Fizzled { reason: String },
}

impl WorkflowState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkflowState::Completed { .. } | WorkflowState::Fizzled { .. }
        )
    }
}

/// A workflow stored by the in-process engine.
#[derive(Debug, Clone)]
pub struct WorkflowEntry {
    pub spec: TaskSpec,
    pub state: WorkflowState,
}

/// Client capability of a workflow engine.
#[async_trait]
pub trait LaunchPad: Send + Sync {
    /// Adds a single-step workflow running `spec` and returns its id.
    async fn add_workflow(&self, spec: TaskSpec) -> anyhow::Result<WorkflowId>;

    /// Current state of a workflow, `None` if the engine does not know the id.
    ///
    /// `Err` is reserved for failures to reach the engine.
    async fn workflow_state(&self, id: WorkflowId) -> anyhow::Result<Option<WorkflowState>>;
}
