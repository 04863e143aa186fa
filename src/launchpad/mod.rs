//! Workflow Engine Module
//!
//! The workflow-engine backend submits each spec as a single-step workflow and
//! later asks the engine for its launch state.
//!
//! ## Submodules
//! - **`local`**: in-process engine with a pool of rocket workers.
//! - **`http`**: client for a remote engine.
//! - **`handlers`**: serves a `LocalLaunchPad` so other nodes can use it remotely.
//! - **`protocol`**: DTOs and endpoints shared by the client and the handlers.

pub mod handlers;
pub mod http;
pub mod local;
pub mod protocol;
pub mod types;

pub use http::HttpLaunchPad;
pub use local::LocalLaunchPad;
pub use types::{LaunchPad, WorkflowId, WorkflowState};
