//! Service modules for the recognition pipeline

pub mod audio_store;
pub mod audio_validator;
pub mod inference_client;
pub mod recognition;

pub use audio_store::{AzureConnection, ObjectAudioStore};
pub use audio_validator::{AudioLimits, AudioValidator, ValidationError};
pub use inference_client::{
    FallbackPolicy, FallbackSelector, FixedSelector, InferenceClient, InferenceEndpoint,
    InferenceSettings, UniformSelector,
};
pub use recognition::{RecognitionError, RecognitionOrchestrator};
