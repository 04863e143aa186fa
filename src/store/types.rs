use crate::backend::types::ResultRecord;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid namespace name: {0:?}")]
    InvalidNamespace(String),

    #[error("unknown namespace: {0}")]
    UnknownNamespace(String),

    #[error("result store unavailable: {0}")]
    Unavailable(String),

    #[error("malformed result record: {0}")]
    Malformed(String),
}

/// The persistent store results are reconciled into.
///
/// Every call names its namespace explicitly; there is no "current namespace"
/// shared between concurrent requests.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Validates a request-supplied namespace and makes it available for writes.
    async fn select_namespace(&self, name: &str) -> Result<(), StoreError>;

    /// Persists one result. `Ok(false)` means the store declined the record.
    async fn add_result(&self, namespace: &str, record: ResultRecord) -> Result<bool, StoreError>;

    /// Looks up stored reference data (e.g. a molecule) by key.
    async fn reference(
        &self,
        namespace: &str,
        key: &str,
    ) -> Result<Option<serde_json::Value>, StoreError>;
}

pub fn validate_namespace(name: &str) -> Result<(), StoreError> {
    let valid = !name.is_empty()
        && name.len() <= 64
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidNamespace(name.to_string()))
    }
}
