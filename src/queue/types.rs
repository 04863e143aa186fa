use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Public identifier of a tracked handle.
///
/// The only representation of an in-flight task that leaves the queue; callers
/// never see the backend handle itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackingId(pub String);

impl TrackingId {
    /// Generates a new random UUID v4-based TrackingId.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for TrackingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TrackingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Read-only view of the queue for status reporting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueueSnapshot {
    /// Identifiers still waiting for their backend to finish.
    pub queue: Vec<TrackingId>,
    /// Diagnostics for tasks that finished unsuccessfully.
    pub errors: HashMap<TrackingId, String>,
}

/// What a single reconciliation pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Finished tasks whose result was written to the store.
    pub stored: usize,
    /// Finished tasks that ended up in the error map.
    pub failed: usize,
}

impl ReconcileReport {
    pub fn is_empty(&self) -> bool {
        self.stored == 0 && self.failed == 0
    }
}
