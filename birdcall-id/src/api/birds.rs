//! Reference catalog endpoints
//!
//! Read-only administrative view of the species catalog used for
//! enrichment.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::models::ReferenceFact;
use crate::types::ReferenceCatalog;
use crate::AppState;

fn catalog(state: &AppState) -> ApiResult<&Arc<dyn ReferenceCatalog>> {
    state
        .catalog
        .as_ref()
        .ok_or_else(|| ApiError::ServiceUnavailable("Reference catalog is not configured".to_string()))
}

/// GET /birds
///
/// Every catalog entry, ordered by species key.
pub async fn list_birds(State(state): State<AppState>) -> ApiResult<Json<Vec<ReferenceFact>>> {
    let facts = catalog(&state)?.list_all().await?;
    Ok(Json(facts))
}

/// GET /birds/:species
///
/// Case-insensitive exact match on the species key.
pub async fn get_bird(
    State(state): State<AppState>,
    Path(species): Path<String>,
) -> ApiResult<Json<ReferenceFact>> {
    let fact = catalog(&state)?.lookup(&species).await?;
    Ok(Json(fact))
}

/// Build catalog routes
pub fn bird_routes() -> Router<AppState> {
    Router::new()
        .route("/birds", get(list_birds))
        .route("/birds/:species", get(get_bird))
}
