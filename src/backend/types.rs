use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A backend-ready description of one unit of work.
///
/// `identity` is the content-addressed key of the input (e.g. a molecule hash)
/// and, together with `method`, keys the eventual result in the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskSpec {
    pub identity: String,
    pub method: String,
    /// Name of the compute program registered in the `ComputeRegistry`.
    pub program: String,
    /// Reference data resolved from the store.
    pub molecule: serde_json::Value,
    pub options: serde_json::Value,
}

/// A successful computation, ready to be written to the result store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultRecord {
    pub identity: String,
    pub method: String,
    pub program: String,
    /// Computed result fields as returned by the compute program.
    pub fields: serde_json::Value,
}

impl ResultRecord {
    pub fn from_spec(spec: &TaskSpec, fields: serde_json::Value) -> Self {
        Self {
            identity: spec.identity.clone(),
            method: spec.method.clone(),
            program: spec.program.clone(),
            fields,
        }
    }
}

/// Terminal payload of a finished handle.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(ResultRecord),
    Failure { message: String },
}

impl Outcome {
    pub fn failure(message: impl Into<String>) -> Self {
        Outcome::Failure {
            message: message.into(),
        }
    }

    /// Interprets the value returned by a compute program.
    ///
    /// Programs may report a soft failure as `{"success": false, "error": "..."}`;
    /// that becomes a `Failure` carrying the error text verbatim.
    pub fn from_compute(spec: &TaskSpec, result: anyhow::Result<serde_json::Value>) -> Self {
        match result {
            Ok(fields) => {
                if fields.get("success").and_then(|v| v.as_bool()) == Some(false) {
                    let message = fields
                        .get("error")
                        .and_then(|v| v.as_str())
                        .map(str::to_string)
                        .unwrap_or_else(|| {
                            format!(
                                "computation ({}, {}) did not complete successfully",
                                spec.identity, spec.method
                            )
                        });
                    return Outcome::Failure { message };
                }
                Outcome::Success(ResultRecord::from_spec(spec, fields))
            }
            Err(e) => Outcome::Failure {
                message: e.to_string(),
            },
        }
    }
}

/// The closed set of execution backends a request can target.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Distributed-function executor (futures on a worker pool).
    Function,
    /// Workflow engine (workflows added to a launchpad).
    Workflow,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "function" | "distributed-function" | "dask" => Ok(BackendKind::Function),
            "workflow" | "workflow-engine" | "fireworks" => Ok(BackendKind::Workflow),
            other => Err(format!("unknown backend: {}", other)),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Function => write!(f, "function"),
            BackendKind::Workflow => write!(f, "workflow"),
        }
    }
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend rejected task: {0}")]
    Rejected(String),

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// An opaque, pollable reference to one in-flight execution.
#[async_trait]
pub trait TaskHandle: Send + Sync {
    /// Whether the execution reached a terminal state.
    async fn is_finished(&self) -> bool;

    /// Retrieves the terminal payload. Only meaningful once `is_finished`
    /// returned true; the outcome is handed out once, later calls report a failure.
    async fn outcome(&mut self) -> Outcome;
}

/// One execution backend: accepts a spec and returns immediately with a handle.
#[async_trait]
pub trait BackendAdapter: Send + Sync {
    fn kind(&self) -> BackendKind;

    async fn submit(&self, spec: TaskSpec) -> Result<Box<dyn TaskHandle>, BackendError>;
}
