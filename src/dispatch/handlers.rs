use super::error::DispatchError;
use super::protocol::*;
use super::service::DispatchService;
use crate::auth::Credentials;

use axum::{
    extract::{Extension, Query},
    http::HeaderMap,
    routing::{delete, get, post},
    Json, Router,
};
use std::sync::Arc;

pub fn routes(service: Arc<DispatchService>) -> Router {
    Router::new()
        .route(ENDPOINT_SUBMIT, post(handle_submit))
        .route(ENDPOINT_POLL, get(handle_poll))
        .route(ENDPOINT_ERRORS, delete(handle_clear_errors))
        .route(ENDPOINT_HEALTH, get(handle_health))
        .layer(Extension(service))
}

fn header_namespace(headers: &HeaderMap) -> Option<String> {
    headers
        .get(HEADER_NAMESPACE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

pub async fn handle_submit(
    Extension(service): Extension<Arc<DispatchService>>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<SubmitResponse>, DispatchError> {
    let credentials = Credentials::from_headers(&headers);
    let namespace = body
        .get("namespace")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .or_else(|| header_namespace(&headers));

    let response = service
        .submit(&credentials, namespace.as_deref(), &body)
        .await?;
    Ok(Json(response))
}

pub async fn handle_poll(
    Extension(service): Extension<Arc<DispatchService>>,
    headers: HeaderMap,
    Query(query): Query<NamespaceQuery>,
) -> Result<Json<PollResponse>, DispatchError> {
    let credentials = Credentials::from_headers(&headers);
    let namespace = query.namespace.or_else(|| header_namespace(&headers));

    let response = service.poll(&credentials, namespace.as_deref()).await?;
    Ok(Json(response))
}

pub async fn handle_clear_errors(
    Extension(service): Extension<Arc<DispatchService>>,
    headers: HeaderMap,
    Query(query): Query<NamespaceQuery>,
) -> Result<Json<ClearErrorsResponse>, DispatchError> {
    let credentials = Credentials::from_headers(&headers);
    let namespace = query.namespace.or_else(|| header_namespace(&headers));

    let cleared = service
        .clear_errors(&credentials, namespace.as_deref())
        .await?;
    Ok(Json(ClearErrorsResponse {
        success: true,
        cleared,
    }))
}

pub async fn handle_health(
    Extension(service): Extension<Arc<DispatchService>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        tracked: service.nanny().tracked_count().await,
        errors: service.nanny().error_count().await,
    })
}
