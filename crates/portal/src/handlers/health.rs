//! Health check endpoint handler.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use softget_backend::core::Backend;
use tracing::debug;

use crate::state::AppState;

/// Handler for the health check endpoint.
///
/// # HTTP Request
///
/// `GET /health`
///
/// # Response
///
/// - `200 OK` - `{status, backend, timestamp}`
pub async fn health_handler<B>(State(state): State<AppState<B>>) -> Response
where
    B: Backend + 'static,
{
    debug!("Processing health check request");

    let body = serde_json::json!({
        "status": "healthy",
        "backend": state.backend().backend_name(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    });

    (StatusCode::OK, Json(body)).into_response()
}
