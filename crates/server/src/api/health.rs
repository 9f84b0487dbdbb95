//! Liveness endpoints.

use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

/// Tag for OpenAPI documentation.
pub const MISC_TAG: &str = "Miscellaneous";

#[derive(Debug, Serialize, ToSchema)]
pub struct Banner {
    pub message: String,
}

/// Identifies the service.
#[tracing::instrument()]
#[utoipa::path(
    get,
    path = "/",
    tag = MISC_TAG,
    operation_id = "Banner",
    summary = "Service banner",
    responses(
        (status = 200, description = "Service name", body = Banner)
    )
)]
pub async fn root() -> Json<Banner> {
    Json(Banner {
        message: "Mock OAuth2 Provider".to_string(),
    })
}

/// Health check endpoint.
#[tracing::instrument()]
#[utoipa::path(
    method(get, head),
    path = "/healthz",
    tag = MISC_TAG,
    operation_id = "Health Check",
    summary = "Service health check",
    description = "Returns a simple health status indicating the service is running and accepting requests.\n\n\
                   Supports both GET and HEAD methods for compatibility with various health check systems.",
    responses(
        (status = 200, description = "Service is healthy", body = str, content_type = "text/plain", example = "ok")
    )
)]
pub async fn health() -> &'static str {
    "ok"
}
