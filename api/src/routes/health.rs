use axum::extract::State;
use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Model the oracle client is configured to query
    pub oracle_model: String,
    /// Rows in the reference dataset (0 when none is configured)
    pub dataset_rows: usize,
}

/// Health check endpoint. The oracle is not probed here; a slow model must
/// not make the service look down.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        oracle_model: state.oracle_model.clone(),
        dataset_rows: state.dataset.len(),
    })
}
