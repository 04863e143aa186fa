use super::protocol::ErrorResponse;
use crate::store::StoreError;
use crate::unpack::UnpackError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Request-level failures. Per-item problems never end up here; they are
/// reported in the submit response's `errors` list instead.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("no namespace given")]
    MissingNamespace,

    #[error(transparent)]
    Namespace(#[from] StoreError),

    #[error("unknown backend: {0}")]
    UnknownBackend(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl From<UnpackError> for DispatchError {
    fn from(e: UnpackError) -> Self {
        match e {
            UnpackError::UnknownBackend(name) => DispatchError::UnknownBackend(name),
            other => DispatchError::InvalidRequest(other.to_string()),
        }
    }
}

impl DispatchError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DispatchError::Unauthorized => StatusCode::UNAUTHORIZED,
            DispatchError::Namespace(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            DispatchError::MissingNamespace
            | DispatchError::Namespace(_)
            | DispatchError::UnknownBackend(_)
            | DispatchError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        (
            status,
            Json(ErrorResponse {
                success: false,
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
