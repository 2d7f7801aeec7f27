//! Recognition pipeline
//!
//! validate -> store (optional) -> predict -> enrich (optional) -> respond.
//!
//! Steps run strictly in order and the first failure ends the request.
//! Storage and catalog are optional collaborators so one orchestrator
//! covers both deployment variants.

use std::sync::Arc;
use thiserror::Error;

use crate::models::{AudioSubmission, EnrichedResult};
use crate::services::audio_validator::{AudioValidator, ValidationError};
use crate::types::{
    AudioStore, CatalogError, InferenceError, ReferenceCatalog, SpeciesPredictor, StorageError,
};

/// Failures of a single identification request
#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    InferenceUnavailable(#[from] InferenceError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Bird species \"{0}\" not found in database")]
    SpeciesNotFound(String),

    #[error(transparent)]
    Catalog(CatalogError),
}

impl From<CatalogError> for RecognitionError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::SpeciesNotFound(species) => RecognitionError::SpeciesNotFound(species),
            other => RecognitionError::Catalog(other),
        }
    }
}

/// Coordinates one identification request across the collaborators
pub struct RecognitionOrchestrator {
    validator: AudioValidator,
    predictor: Arc<dyn SpeciesPredictor>,
    store: Option<Arc<dyn AudioStore>>,
    catalog: Option<Arc<dyn ReferenceCatalog>>,
}

impl RecognitionOrchestrator {
    /// Minimal pipeline: validation and prediction only
    pub fn new(validator: AudioValidator, predictor: Arc<dyn SpeciesPredictor>) -> Self {
        Self {
            validator,
            predictor,
            store: None,
            catalog: None,
        }
    }

    /// Upload every accepted recording before prediction
    pub fn with_store(mut self, store: Arc<dyn AudioStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Enrich every prediction with catalog facts
    pub fn with_catalog(mut self, catalog: Arc<dyn ReferenceCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn validator(&self) -> &AudioValidator {
        &self.validator
    }

    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    pub fn has_catalog(&self) -> bool {
        self.catalog.is_some()
    }

    /// Run the full pipeline for one submission
    pub async fn identify(
        &self,
        submission: AudioSubmission,
    ) -> Result<EnrichedResult, RecognitionError> {
        if let Err(e) = self.validator.validate(&submission) {
            tracing::info!(
                filename = %submission.filename,
                content_type = %submission.content_type,
                size = submission.declared_size,
                error = %e,
                "Rejected audio submission"
            );
            return Err(e.into());
        }

        tracing::info!(
            filename = %submission.filename,
            content_type = %submission.content_type,
            size = submission.declared_size,
            location = submission.metadata.location.as_deref().unwrap_or("-"),
            recorded_at = submission.metadata.recorded_at.as_deref().unwrap_or("-"),
            "Identifying bird call"
        );

        let audio_url = match &self.store {
            Some(store) => match store.upload(&submission).await {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::error!(error = %e, "Audio upload failed");
                    return Err(e.into());
                }
            },
            None => None,
        };

        let prediction = self
            .predictor
            .predict(&submission.payload, audio_url.as_deref())
            .await?;

        let Some(catalog) = &self.catalog else {
            return Ok(EnrichedResult::bare(prediction));
        };

        match catalog.lookup(&prediction.species).await {
            Ok(fact) => {
                tracing::debug!(species = %prediction.species, "Prediction enriched from catalog");
                Ok(EnrichedResult::enriched(prediction, &fact))
            }
            Err(e) => {
                tracing::error!(species = %prediction.species, error = %e, "Catalog enrichment failed");
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_miss_becomes_species_not_found() {
        let err = RecognitionError::from(CatalogError::SpeciesNotFound("Unknown".to_string()));
        assert!(matches!(err, RecognitionError::SpeciesNotFound(ref s) if s == "Unknown"));
        assert_eq!(err.to_string(), "Bird species \"Unknown\" not found in database");
    }

    #[test]
    fn test_catalog_store_failure_stays_catalog() {
        let err = RecognitionError::from(CatalogError::Seed("bad json".to_string()));
        assert!(matches!(err, RecognitionError::Catalog(_)));
    }

    #[test]
    fn test_validation_message_passes_through() {
        let err = RecognitionError::from(ValidationError::MissingFile);
        assert_eq!(err.to_string(), "No audio file provided");
    }
}
