//! Health check handlers

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub estimator_enabled: bool,
    pub storage: String,
    pub scans: Option<usize>,
}

/// Health check endpoint handler
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let (status, scans) = match state.log.len().await {
        Ok(count) => ("healthy", Some(count)),
        Err(e) => {
            tracing::warn!("Scan log unavailable: {}", e);
            ("degraded", None)
        }
    };

    Json(HealthResponse {
        status: status.to_string(),
        service: "dining-waste-tracker".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        estimator_enabled: state.scans.estimator_enabled(),
        storage: state.log.backend_name().to_string(),
        scans,
    })
}
