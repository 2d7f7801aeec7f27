//! Bird call identification endpoint
//!
//! POST /bird-recognition/identify takes a multipart upload with the
//! recording in field `file` (`audioFile` is accepted too) and optional
//! `location` and `recordedAt` text fields.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use serde::Serialize;

use crate::error::ApiResult;
use crate::models::{AudioSubmission, EnrichedResult, SubmissionMetadata};
use crate::AppState;

const FILE_FIELDS: &[&str] = &["file", "audioFile"];
const DEFAULT_FILENAME: &str = "recording";

/// Client-side pre-check limits
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadLimitsResponse {
    pub max_bytes: u64,
    pub accepted_types: Vec<String>,
}

/// POST /bird-recognition/identify
///
/// 201 with the (optionally enriched) prediction.
pub async fn identify(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<EnrichedResult>)> {
    let submission = read_submission(multipart).await?;
    let result = state.orchestrator.identify(submission).await?;

    tracing::info!(
        id = %result.prediction.id,
        species = %result.prediction.species,
        confidence = result.prediction.confidence,
        enriched = result.details.is_some(),
        "Bird call identified"
    );

    Ok((StatusCode::CREATED, Json(result)))
}

/// GET /bird-recognition/limits
///
/// What an upload client should check before sending anything.
pub async fn upload_limits(State(state): State<AppState>) -> Json<UploadLimitsResponse> {
    Json(UploadLimitsResponse {
        max_bytes: state.client_limits.max_bytes,
        accepted_types: state.client_limits.accepted_types.clone(),
    })
}

/// Collect the multipart fields into a submission
///
/// A missing file field yields an empty payload, which validation rejects.
async fn read_submission(mut multipart: Multipart) -> ApiResult<AudioSubmission> {
    let mut payload = Bytes::new();
    let mut content_type = String::new();
    let mut filename = DEFAULT_FILENAME.to_string();
    let mut metadata = SubmissionMetadata::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        if FILE_FIELDS.contains(&name.as_str()) {
            content_type = field.content_type().unwrap_or_default().to_string();
            if let Some(original) = field.file_name().filter(|f| !f.is_empty()) {
                filename = original.to_string();
            }
            payload = field.bytes().await?;
            continue;
        }

        match name.as_str() {
            "location" => metadata.location = non_empty(field.text().await?),
            "recordedAt" => metadata.recorded_at = non_empty(field.text().await?),
            other => tracing::debug!(field = other, "Ignoring unknown multipart field"),
        }
    }

    Ok(AudioSubmission::new(payload, content_type, filename).with_metadata(metadata))
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Build identification routes
///
/// `body_limit` replaces axum's default request body ceiling for uploads.
pub fn identify_routes(body_limit: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/bird-recognition/identify",
            post(identify).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/bird-recognition/limits", get(upload_limits))
}
