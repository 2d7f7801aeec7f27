//! Core Types and Trait Definitions for birdcall-id
//!
//! The recognition pipeline reaches each collaborator through a trait:
//! - [`SpeciesPredictor`]: remote inference (with synthetic fallback)
//! - [`AudioStore`]: durable storage for uploaded recordings
//! - [`ReferenceCatalog`]: static species reference facts
//!
//! Production implementations live in `services` and `db`; tests substitute
//! their own doubles.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::models::{AudioSubmission, PredictionRecord, ReferenceFact};

// ============================================================================
// Inference
// ============================================================================

/// Produces a species prediction for an audio payload
///
/// # Example
/// ```rust,ignore
/// let record = predictor.predict(&submission.payload, Some(&url)).await?;
/// assert!((0.0..=1.0).contains(&record.confidence));
/// ```
#[async_trait]
pub trait SpeciesPredictor: Send + Sync {
    /// Predict the species in `audio`, attaching `audio_url` to the record
    async fn predict(
        &self,
        audio: &Bytes,
        audio_url: Option<&str>,
    ) -> Result<PredictionRecord, InferenceError>;
}

/// Remote inference failures
///
/// Any of these may be masked by the synthetic fallback, depending on
/// the configured fallback policy.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Connection, TLS or timeout failure
    #[error("Inference request failed: {0}")]
    Transport(String),

    /// Endpoint answered with a non-2xx status
    #[error("Inference service returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body was not a valid prediction
    #[error("Malformed inference response: {0}")]
    Malformed(String),
}

// ============================================================================
// Durable storage
// ============================================================================

/// Stores raw audio and hands back a durable URL
#[async_trait]
pub trait AudioStore: Send + Sync {
    /// Store the submission's bytes under a fresh opaque name
    async fn upload(&self, submission: &AudioSubmission) -> Result<String, StorageError>;

    /// Delete a previously stored object by its URL
    async fn delete(&self, url: &str) -> Result<(), StorageError>;
}

/// Object store failures (never masked)
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid storage configuration: {0}")]
    Config(String),

    #[error("File upload failed: {0}")]
    Upload(String),

    #[error("File deletion failed: {0}")]
    Delete(String),

    #[error("Not a stored audio URL: {0}")]
    InvalidUrl(String),
}

// ============================================================================
// Reference catalog
// ============================================================================

/// Read-only lookup of species reference facts
#[async_trait]
pub trait ReferenceCatalog: Send + Sync {
    /// Exact species key match ignoring letter case
    async fn lookup(&self, species: &str) -> Result<ReferenceFact, CatalogError>;

    /// Every catalog entry, ordered by species key
    async fn list_all(&self) -> Result<Vec<ReferenceFact>, CatalogError>;
}

/// Catalog failures
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Bird species \"{0}\" not found in database")]
    SpeciesNotFound(String),

    #[error("Catalog database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Catalog seed failed: {0}")]
    Seed(String),
}
