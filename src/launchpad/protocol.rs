//! Workflow Engine Protocol
//!
//! DTOs exchanged between `HttpLaunchPad` and a node serving its
//! `LocalLaunchPad` through `handlers`.

use super::types::{WorkflowId, WorkflowState};
use crate::backend::types::TaskSpec;
use serde::{Deserialize, Serialize};

pub const ENDPOINT_WORKFLOWS: &str = "/workflows";

#[derive(Debug, Serialize, Deserialize)]
pub struct AddWorkflowRequest {
    pub spec: TaskSpec,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddWorkflowResponse {
    pub fw_id: WorkflowId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WorkflowStateResponse {
    pub fw_id: WorkflowId,
    /// `None` when the engine does not know the workflow.
    pub state: Option<WorkflowState>,
}
