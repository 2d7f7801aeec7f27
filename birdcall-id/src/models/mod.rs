//! Data models for birdcall-id
//!
//! - Upload submission (request-scoped)
//! - Prediction record, reference facts and the enriched response

pub mod prediction;
pub mod submission;

pub use prediction::{
    AlternativePrediction, BirdDetails, EnrichedResult, PredictionRecord, ReferenceFact,
    species_key,
};
pub use submission::{AudioSubmission, SubmissionMetadata};
