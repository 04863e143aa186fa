use crate::backend::types::{BackendKind, TaskSpec};
use crate::store::ResultStore;

use async_trait::async_trait;
use thiserror::Error;

/// One entry of an unpacked batch.
#[derive(Debug, Clone, PartialEq)]
pub enum UnpackedItem {
    Task(TaskSpec),
    /// The requested task could not be built; carries a human-readable reason.
    Error(String),
}

/// Problems that invalidate the whole request rather than a single item.
#[derive(Debug, Error)]
pub enum UnpackError {
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error("unknown backend: {0}")]
    UnknownBackend(String),

    #[error("unknown compute program: {0}")]
    UnknownProgram(String),
}

/// Turns a raw request body plus stored reference data into backend-ready specs.
#[async_trait]
pub trait Unpacker: Send + Sync {
    /// Returns the items in request order and the backend all of them target.
    async fn unpack(
        &self,
        body: &serde_json::Value,
        namespace: &str,
        store: &dyn ResultStore,
    ) -> Result<(Vec<UnpackedItem>, BackendKind), UnpackError>;
}
