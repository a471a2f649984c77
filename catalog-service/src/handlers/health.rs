//! Liveness endpoint

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use crate::repository::CatalogStore;
use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HealthResponse {
    /// Always `ok` while the process serves requests
    pub status: String,

    pub service: String,

    pub version: String,
}

/// Always 200 while the service is running
#[cfg_attr(
    feature = "openapi",
    utoipa::path(
        get,
        path = "/health",
        tag = "health",
        operation_id = "health",
        responses(
            (status = 200, description = "Service is up", body = HealthResponse),
        )
    )
)]
pub async fn health<S: CatalogStore>(State(state): State<AppState<S>>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        service: state.config().service.name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    (StatusCode::OK, Json(response))
}
