//! birdcall-id library interface
//!
//! Exposes the recognition pipeline and HTTP router for integration testing.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod types;

pub use crate::api::health::InferenceMode;
pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::services::{AudioLimits, RecognitionOrchestrator};
use crate::types::ReferenceCatalog;

/// Headroom above the upload ceiling for multipart boundaries and text fields
pub const MULTIPART_OVERHEAD_BYTES: u64 = 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Identification pipeline
    pub orchestrator: Arc<RecognitionOrchestrator>,
    /// Catalog for the `/birds` endpoints
    pub catalog: Option<Arc<dyn ReferenceCatalog>>,
    /// Limits advertised to upload clients
    pub client_limits: AudioLimits,
    pub inference_mode: InferenceMode,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(orchestrator: RecognitionOrchestrator, inference_mode: InferenceMode) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            catalog: None,
            client_limits: AudioLimits::client(),
            inference_mode,
            startup_time: Utc::now(),
        }
    }

    /// Expose a catalog on `/birds`
    pub fn with_catalog(mut self, catalog: Arc<dyn ReferenceCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_client_limits(mut self, limits: AudioLimits) -> Self {
        self.client_limits = limits;
        self
    }

    /// Request body ceiling: server upload limit plus multipart overhead
    pub fn body_limit(&self) -> usize {
        let max_bytes = self.orchestrator.validator().limits().max_bytes;
        usize::try_from(max_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES)).unwrap_or(usize::MAX)
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::identify_routes(state.body_limit()))
        .merge(api::bird_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
