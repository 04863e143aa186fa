use super::local::LocalLaunchPad;
use super::protocol::*;
use super::types::*;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

/// Routes exposing a `LocalLaunchPad` to remote `HttpLaunchPad` clients.
pub fn routes(launchpad: Arc<LocalLaunchPad>) -> Router {
    Router::new()
        .route(ENDPOINT_WORKFLOWS, post(handle_add_workflow))
        .route("/workflows/:id", get(handle_workflow_state))
        .layer(Extension(launchpad))
}

pub async fn handle_add_workflow(
    Extension(launchpad): Extension<Arc<LocalLaunchPad>>,
    Json(req): Json<AddWorkflowRequest>,
) -> (StatusCode, Json<Option<AddWorkflowResponse>>) {
    match launchpad.add_workflow(req.spec).await {
        Ok(fw_id) => (StatusCode::OK, Json(Some(AddWorkflowResponse { fw_id }))),
        Err(e) => {
            tracing::error!("Failed to add workflow: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(None))
        }
    }
}

pub async fn handle_workflow_state(
    Extension(launchpad): Extension<Arc<LocalLaunchPad>>,
    Path(id): Path<u64>,
) -> (StatusCode, Json<WorkflowStateResponse>) {
    let fw_id = WorkflowId(id);

    match launchpad.get(fw_id) {
        Some(entry) => (
            StatusCode::OK,
            Json(WorkflowStateResponse {
                fw_id,
                state: Some(entry.state),
            }),
        ),
        None => {
            tracing::debug!("Workflow not found: {}", fw_id);
            (
                StatusCode::NOT_FOUND,
                Json(WorkflowStateResponse { fw_id, state: None }),
            )
        }
    }
}
