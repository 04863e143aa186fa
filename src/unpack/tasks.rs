//! Default Task Unpacker
//!
//! Request body:
//! ```json
//! {
//!   "namespace": "ns1",
//!   "tasks": ["b3lyp@water", "mp2@methane"],
//!   "program": "psi4",
//!   "backend": "workflow",
//!   "options": {"basis": "cc-pVDZ"}
//! }
//! ```
//! Each task is `method@reference`; `reference` names reference data stored in the
//! namespace. `program`, `backend` and `options` are optional.

use super::types::*;
use crate::backend::registry::ComputeRegistry;
use crate::backend::types::{BackendKind, TaskSpec};
use crate::store::ResultStore;

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct SubmitBody {
    tasks: Vec<serde_json::Value>,
    program: Option<String>,
    backend: Option<String>,
    #[serde(default)]
    options: serde_json::Value,
}

pub struct TaskUnpacker {
    registry: Arc<ComputeRegistry>,
    default_program: String,
    default_backend: BackendKind,
}

impl TaskUnpacker {
    pub fn new(
        registry: Arc<ComputeRegistry>,
        default_program: &str,
        default_backend: BackendKind,
    ) -> Self {
        Self {
            registry,
            default_program: default_program.to_string(),
            default_backend,
        }
    }

    async fn unpack_entry(
        &self,
        position: usize,
        entry: &serde_json::Value,
        program: &str,
        options: &serde_json::Value,
        namespace: &str,
        store: &dyn ResultStore,
    ) -> UnpackedItem {
        let Some(raw) = entry.as_str() else {
            return UnpackedItem::Error(format!("malformed task entry at position {}", position));
        };

        // A bare entry without '@' is read as a reference with no method.
        let (method, reference) = match raw.split_once('@') {
            Some((method, reference)) => (method.trim(), reference.trim()),
            None => ("", raw.trim()),
        };

        let molecule = match store.reference(namespace, reference).await {
            Ok(Some(molecule)) => molecule,
            Ok(None) => return UnpackedItem::Error(format!("unknown reference: {}", reference)),
            Err(e) => {
                return UnpackedItem::Error(format!(
                    "reference lookup failed for {}: {}",
                    reference, e
                ))
            }
        };

        if method.is_empty() {
            return UnpackedItem::Error(format!("missing method for reference: {}", reference));
        }

        let identity = molecule
            .get("hash")
            .and_then(|h| h.as_str())
            .unwrap_or(reference)
            .to_string();

        UnpackedItem::Task(TaskSpec {
            identity,
            method: method.to_string(),
            program: program.to_string(),
            molecule,
            options: options.clone(),
        })
    }
}

#[async_trait]
impl Unpacker for TaskUnpacker {
    async fn unpack(
        &self,
        body: &serde_json::Value,
        namespace: &str,
        store: &dyn ResultStore,
    ) -> Result<(Vec<UnpackedItem>, BackendKind), UnpackError> {
        let body: SubmitBody = serde_json::from_value(body.clone())
            .map_err(|e| UnpackError::InvalidBody(e.to_string()))?;

        let backend = match body.backend.as_deref() {
            Some(name) => name
                .parse::<BackendKind>()
                .map_err(|_| UnpackError::UnknownBackend(name.to_string()))?,
            None => self.default_backend,
        };

        let program = body
            .program
            .unwrap_or_else(|| self.default_program.clone());
        if !self.registry.has_program(&program) {
            return Err(UnpackError::UnknownProgram(program));
        }

        let options = if body.options.is_null() {
            serde_json::json!({})
        } else {
            body.options
        };

        let mut items = Vec::with_capacity(body.tasks.len());
        for (position, entry) in body.tasks.iter().enumerate() {
            items.push(
                self.unpack_entry(position, entry, &program, &options, namespace, store)
                    .await,
            );
        }

        tracing::debug!(
            "Unpacked {} task(s) for {} on the {} backend",
            items.len(),
            program,
            backend
        );

        Ok((items, backend))
    }
}
