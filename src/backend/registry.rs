//! Compute Program Registry
//!
//! Maps program names (e.g. "psi4") to async compute functions. Both backends
//! execute specs through this registry, so the dispatch layer never needs to
//! know what a program actually computes.

use super::types::TaskSpec;

use anyhow::Result;
use dashmap::DashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Type alias for a thread-safe, asynchronous compute function.
/// It takes a `TaskSpec` and resolves to the computed result fields.
pub type ComputeFn = Arc<
    dyn Fn(TaskSpec) -> Pin<Box<dyn Future<Output = Result<serde_json::Value>> + Send>>
        + Send
        + Sync,
>;

/// Registry holding the mapping between program names and their implementation.
pub struct ComputeRegistry {
    programs: DashMap<String, ComputeFn>,
}

impl ComputeRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers a compute function under a program name, replacing any previous one.
    pub fn register<F, Fut>(&self, program: &str, compute: F)
    where
        F: Fn(TaskSpec) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<serde_json::Value>> + Send + 'static,
    {
        // Box::pin type-erases the concrete future so different programs share one map.
        let compute_fn: ComputeFn = Arc::new(move |spec: TaskSpec| {
            Box::pin(compute(spec))
                as Pin<Box<dyn Future<Output = Result<serde_json::Value>> + Send>>
        });

        self.programs.insert(program.to_string(), compute_fn);

        tracing::info!("Registered compute program: {}", program);
    }

    /// Runs the program named by `spec.program`.
    ///
    /// # Returns
    /// * `Ok(fields)` with the computed result fields.
    /// * `Err` if the program failed or no program exists under that name.
    pub async fn execute(&self, spec: TaskSpec) -> Result<serde_json::Value> {
        // Clone the Arc out so the DashMap guard is not held across the await.
        let compute_fn = self
            .programs
            .get(&spec.program)
            .map(|entry| entry.value().clone());

        match compute_fn {
            Some(compute_fn) => {
                tracing::debug!(
                    "Executing {} for ({}, {})",
                    spec.program,
                    spec.identity,
                    spec.method
                );
                compute_fn(spec).await
            }
            None => {
                let error = format!("Unknown compute program: {}", spec.program);
                tracing::error!("{}", error);
                Err(anyhow::anyhow!(error))
            }
        }
    }

    pub fn list_programs(&self) -> Vec<String> {
        self.programs
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub fn has_program(&self, program: &str) -> bool {
        self.programs.contains_key(program)
    }
}

impl Default for ComputeRegistry {
    fn default() -> Self {
        Self {
            programs: DashMap::new(),
        }
    }
}
