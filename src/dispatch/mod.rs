//! Dispatch Module
//!
//! Public submit/poll surface of the service.
//!
//! ## Request Flow
//! 1. **Submit**: authenticate -> select namespace -> unpack batch -> submit each spec
//!    to the resolved backend -> `QueueNanny::track` -> `{success, identifiers, errors}`.
//! 2. **Poll**: authenticate -> select namespace -> (optionally) reconcile ->
//!    namespace snapshot -> `{queue, errors}`.

pub mod error;
pub mod handlers;
pub mod protocol;
pub mod service;

pub use error::DispatchError;
pub use service::DispatchService;
