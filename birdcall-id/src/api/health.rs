//! Health check endpoint
//!
//! Reports uptime and which optional collaborators this instance runs with.

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

/// Where predictions come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InferenceMode {
    /// A prediction endpoint is configured
    Remote,
    /// No endpoint; every prediction is synthetic
    Synthetic,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status ("ok")
    pub status: String,
    /// Module name ("birdcall-id")
    pub module: String,
    /// Crate version from Cargo.toml
    pub version: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
    pub inference_mode: InferenceMode,
    /// Durable audio storage configured
    pub storage_enabled: bool,
    /// Reference catalog enrichment configured
    pub catalog_enabled: bool,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    Json(HealthResponse {
        status: "ok".to_string(),
        module: "birdcall-id".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        inference_mode: state.inference_mode,
        storage_enabled: state.orchestrator.has_store(),
        catalog_enabled: state.orchestrator.has_catalog(),
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
