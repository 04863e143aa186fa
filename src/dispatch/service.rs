//! Dispatch Service
//!
//! The request-facing layer: authenticates, scopes the request to a namespace,
//! unpacks the batch, forwards each spec to the backend the batch targets, and
//! registers the returned handles with the `QueueNanny`.

use super::error::DispatchError;
use super::protocol::{PollResponse, SubmitResponse};
use crate::auth::{Authenticator, Credentials};
use crate::backend::types::{BackendAdapter, BackendKind};
use crate::queue::QueueNanny;
use crate::store::ResultStore;
use crate::unpack::{UnpackedItem, Unpacker};

use std::collections::HashMap;
use std::sync::Arc;

pub struct DispatchService {
    authenticator: Arc<dyn Authenticator>,
    store: Arc<dyn ResultStore>,
    unpacker: Arc<dyn Unpacker>,
    nanny: Arc<QueueNanny>,
    backends: HashMap<BackendKind, Arc<dyn BackendAdapter>>,
    /// Reconcile before answering a poll so the snapshot includes just-finished work.
    reconcile_on_poll: bool,
}

impl DispatchService {
    pub fn new(
        authenticator: Arc<dyn Authenticator>,
        store: Arc<dyn ResultStore>,
        unpacker: Arc<dyn Unpacker>,
        nanny: Arc<QueueNanny>,
    ) -> Self {
        Self {
            authenticator,
            store,
            unpacker,
            nanny,
            backends: HashMap::new(),
            reconcile_on_poll: true,
        }
    }

    /// Registers the adapter for its `BackendKind`, replacing any previous one.
    pub fn with_backend(mut self, backend: Arc<dyn BackendAdapter>) -> Self {
        tracing::info!("Registered {} backend", backend.kind());
        self.backends.insert(backend.kind(), backend);
        self
    }

    pub fn with_reconcile_on_poll(mut self, enabled: bool) -> Self {
        self.reconcile_on_poll = enabled;
        self
    }

    pub fn nanny(&self) -> &Arc<QueueNanny> {
        &self.nanny
    }

    fn authenticate(&self, credentials: &Credentials) -> Result<(), DispatchError> {
        if self.authenticator.authenticate(credentials) {
            Ok(())
        } else {
            tracing::warn!(
                "Rejected request from {:?}",
                credentials.username.as_deref().unwrap_or("<anonymous>")
            );
            Err(DispatchError::Unauthorized)
        }
    }

    async fn select_namespace(&self, namespace: Option<&str>) -> Result<String, DispatchError> {
        let namespace = namespace.ok_or(DispatchError::MissingNamespace)?;
        self.store.select_namespace(namespace).await?;
        Ok(namespace.to_string())
    }

    /// Submits a batch.
    ///
    /// Items the unpacker could not build, and items a backend refused, are reported
    /// in `errors` without affecting the rest of the batch. Only authentication,
    /// namespace selection, and an unresolvable backend fail the whole request.
    pub async fn submit(
        &self,
        credentials: &Credentials,
        namespace: Option<&str>,
        body: &serde_json::Value,
    ) -> Result<SubmitResponse, DispatchError> {
        self.authenticate(credentials)?;
        let namespace = self.select_namespace(namespace).await?;

        let (items, kind) = self
            .unpacker
            .unpack(body, &namespace, self.store.as_ref())
            .await?;

        let backend = self
            .backends
            .get(&kind)
            .cloned()
            .ok_or_else(|| DispatchError::UnknownBackend(kind.to_string()))?;

        let mut identifiers = Vec::new();
        let mut errors = Vec::new();

        for item in items {
            let spec = match item {
                UnpackedItem::Task(spec) => spec,
                UnpackedItem::Error(message) => {
                    errors.push(message);
                    continue;
                }
            };

            match backend.submit(spec).await {
                Ok(handle) => {
                    let id = self.nanny.track(&namespace, handle).await;
                    identifiers.push(id.0);
                }
                Err(e) => {
                    tracing::error!("Backend {} refused a task: {}", kind, e);
                    errors.push(format!("backend submission failed: {}", e));
                }
            }
        }

        tracing::info!(
            "Submitted {} task(s) to {} in {} ({} rejected)",
            identifiers.len(),
            kind,
            namespace,
            errors.len()
        );

        Ok(SubmitResponse {
            success: true,
            identifiers,
            errors,
        })
    }

    /// Reports the tasks still queued and the errors filed for a namespace.
    pub async fn poll(
        &self,
        credentials: &Credentials,
        namespace: Option<&str>,
    ) -> Result<PollResponse, DispatchError> {
        self.authenticate(credentials)?;
        let namespace = self.select_namespace(namespace).await?;

        if self.reconcile_on_poll {
            self.nanny.reconcile().await;
        }

        let snapshot = self.nanny.snapshot_namespace(&namespace).await;

        Ok(PollResponse {
            queue: snapshot.queue.into_iter().map(|id| id.0).collect(),
            errors: snapshot
                .errors
                .into_iter()
                .map(|(id, message)| (id.0, message))
                .collect(),
        })
    }

    /// Clears the errors filed for a namespace; returns how many were removed.
    pub async fn clear_errors(
        &self,
        credentials: &Credentials,
        namespace: Option<&str>,
    ) -> Result<usize, DispatchError> {
        self.authenticate(credentials)?;
        let namespace = self.select_namespace(namespace).await?;
        Ok(self.nanny.clear_errors(&namespace).await)
    }
}
