//! Execution Backends
//!
//! A backend accepts a `TaskSpec` and hands back a pollable `TaskHandle` without
//! waiting for the work to finish. Every backend satisfies the same two-operation
//! handle contract ("is it finished", "give me the outcome"), so the queue never
//! needs to know which engine ran a task.
//!
//! ## Submodules
//! - **`function`**: distributed-function executor; futures on a bounded worker pool.
//! - **`workflow`**: workflow engine; one workflow per spec on a `LaunchPad`.
//! - **`registry`**: maps program names to the compute functions both backends run.
//! - **`types`**: specs, outcomes, backend kinds and the adapter/handle traits.

pub mod function;
pub mod registry;
pub mod types;
pub mod workflow;

pub use function::FunctionBackend;
pub use registry::ComputeRegistry;
pub use types::{
    BackendAdapter, BackendError, BackendKind, Outcome, ResultRecord, TaskHandle, TaskSpec,
};
pub use workflow::WorkflowBackend;

#[cfg(test)]
mod tests;
