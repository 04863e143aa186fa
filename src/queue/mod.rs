//! Task Queue Module
//!
//! In-flight task bookkeeping. The `QueueNanny` owns the handles returned by the
//! backends, mints the `TrackingId`s handed to callers, and reconciles finished
//! handles into the result store.
//!
//! Finished-detection and outcome retrieval are separate handle operations, so
//! reconciliation can be driven by the background loop (`spawn_reconciler`), by a
//! poll request, or both, without changing the bookkeeping.

pub mod nanny;
pub mod types;

pub use nanny::QueueNanny;
pub use types::{QueueSnapshot, ReconcileReport, TrackingId};
