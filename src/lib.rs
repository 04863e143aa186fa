//! Compute Dispatch Service Library
//!
//! Dispatches independent compute tasks to pluggable execution backends, tracks every
//! outstanding task until it finishes, and reconciles the outcome: successful
//! results go to the result store, failures are kept as diagnostics for polling.
//!
//! ## Architecture Modules
//! - **`dispatch`**: the request-facing layer. Authenticates, selects the namespace,
//!   unpacks the batch, submits to a backend, and reports queue/error state.
//! - **`queue`**: the `QueueNanny`, which owns in-flight handles and reconciles
//!   finished ones into the store.
//! - **`backend`**: the uniform `submit(spec) -> handle` capability, implemented by a
//!   distributed-function executor and a workflow-engine executor.
//! - **`launchpad`**: the workflow engine the workflow backend talks to, in-process
//!   or over HTTP.
//! - **`store`**: the result store capability plus an in-memory implementation.
//! - **`unpack`**: turns request bodies into task specs or per-item error markers.
//! - **`auth`**, **`config`**, **`logging`**: request authentication, settings,
//!   and tracing setup.

pub mod auth;
pub mod backend;
pub mod config;
pub mod dispatch;
pub mod launchpad;
pub mod logging;
pub mod queue;
pub mod store;
pub mod unpack;
