//! Dispatch API Definitions
//!
//! Endpoints and DTOs of the public submit/poll surface.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const ENDPOINT_SUBMIT: &str = "/task/submit";
pub const ENDPOINT_POLL: &str = "/task/poll";
pub const ENDPOINT_ERRORS: &str = "/task/errors";
pub const ENDPOINT_HEALTH: &str = "/health";

/// Header naming the namespace when the body or query string does not.
pub const HEADER_NAMESPACE: &str = "project";

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SubmitResponse {
    pub success: bool,
    /// Tracking ids of the accepted tasks, in request order.
    pub identifiers: Vec<String>,
    /// One message per item that was not submitted, in request order.
    pub errors: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct PollResponse {
    /// Tracking ids still waiting on their backend.
    pub queue: Vec<String>,
    /// Tracking id -> diagnostic for tasks that failed.
    pub errors: BTreeMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ClearErrorsResponse {
    pub success: bool,
    pub cleared: usize,
}

#[derive(Debug, Deserialize, Default)]
pub struct NamespaceQuery {
    pub namespace: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub tracked: usize,
    pub errors: usize,
}
