//! Prediction, reference and response records
//!
//! All JSON is camelCase to match the public response contract.

use serde::{Deserialize, Serialize};

/// Lower-confidence candidate reported alongside the primary species
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativePrediction {
    /// Species key or display name, as reported by the source
    pub species: String,
    /// Confidence score (0.0-1.0)
    pub confidence: f64,
}

/// Canonical prediction produced by the inference client
///
/// Same shape whether it came from the remote model or the synthetic
/// fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRecord {
    /// Generated per call, see `birdcall_common::ids::prediction_id`
    pub id: String,
    /// Species key (join key into the reference catalog)
    pub species: String,
    pub common_name: String,
    pub scientific_name: String,
    /// Confidence score (0.0-1.0)
    pub confidence: f64,
    /// ISO-8601 time the prediction was produced
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative_predictions: Option<Vec<AlternativePrediction>>,
    /// Durable URL of the uploaded audio, when storage is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

impl PredictionRecord {
    pub fn alternatives(&self) -> &[AlternativePrediction] {
        self.alternative_predictions.as_deref().unwrap_or(&[])
    }
}

/// Case-folded form of a species key used for matching
///
/// Folds full Unicode, so `Ñandú` and `ñandú` share a key.
pub fn species_key(species: &str) -> String {
    species.to_lowercase()
}

/// Reference facts about a species, as held by the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceFact {
    pub species: String,
    pub common_name: String,
    pub scientific_name: String,
    /// Image URL
    pub image: String,
    pub size: String,
    pub weight: String,
    pub colors: String,
    pub habitat: String,
}

/// Descriptive projection of a [`ReferenceFact`] attached to a response
///
/// Names are deliberately absent: the response keeps the prediction's names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BirdDetails {
    pub image: String,
    pub size: String,
    pub weight: String,
    pub colors: String,
    pub habitat: String,
}

impl From<&ReferenceFact> for BirdDetails {
    fn from(fact: &ReferenceFact) -> Self {
        Self {
            image: fact.image.clone(),
            size: fact.size.clone(),
            weight: fact.weight.clone(),
            colors: fact.colors.clone(),
            habitat: fact.habitat.clone(),
        }
    }
}

/// Identification response: the prediction plus optional catalog details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedResult {
    #[serde(flatten)]
    pub prediction: PredictionRecord,
    /// Present iff enrichment ran and the species was found
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<BirdDetails>,
}

impl EnrichedResult {
    /// Response for deployments without catalog enrichment
    pub fn bare(prediction: PredictionRecord) -> Self {
        Self {
            prediction,
            details: None,
        }
    }

    pub fn enriched(prediction: PredictionRecord, fact: &ReferenceFact) -> Self {
        Self {
            prediction,
            details: Some(BirdDetails::from(fact)),
        }
    }
}
