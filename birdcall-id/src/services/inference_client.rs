//! Remote species inference client
//!
//! Posts the recording to the configured prediction endpoint as a
//! single-part multipart body and maps the model's answer onto a
//! [`PredictionRecord`]. When no endpoint is configured, or the endpoint
//! fails and the fallback policy is [`FallbackPolicy::Synthetic`], a
//! synthetic record of identical shape is returned instead.

use async_trait::async_trait;
use bytes::Bytes;
use rand::Rng;
use reqwest::multipart;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use birdcall_common::config::DEFAULT_INFERENCE_TIMEOUT_SECS;
use birdcall_common::{ids, time};

use crate::models::{species_key, AlternativePrediction, PredictionRecord};
use crate::types::{InferenceError, SpeciesPredictor};

const USER_AGENT: &str = concat!("birdcall-id/", env!("CARGO_PKG_VERSION"));

/// Multipart field carrying the recording
pub const AUDIO_FIELD: &str = "audio";
const AUDIO_FILENAME: &str = "audio.wav";
const AUDIO_CONTENT_TYPE: &str = "audio/wav";

/// Upstream error bodies are cut to this many bytes before logging
const MAX_ERROR_BODY: usize = 512;

/// Number of alternatives attached to a synthetic prediction
const SYNTHETIC_ALTERNATIVES: usize = 2;

/// What to do when a configured endpoint fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// Log the failure and answer with a synthetic prediction
    #[default]
    Synthetic,
    /// Return `InferenceUnavailable` to the caller
    Surface,
}

impl FromStr for FallbackPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "synthetic" | "mask" => Ok(FallbackPolicy::Synthetic),
            "surface" | "none" => Ok(FallbackPolicy::Surface),
            other => Err(format!(
                "unknown fallback policy '{}' (expected 'synthetic' or 'surface')",
                other
            )),
        }
    }
}

/// Prediction endpoint and optional bearer credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceEndpoint {
    pub url: String,
    pub api_key: Option<String>,
}

/// Construction parameters for [`InferenceClient`]
#[derive(Debug, Clone)]
pub struct InferenceSettings {
    /// `None` selects synthetic-only mode
    pub endpoint: Option<InferenceEndpoint>,
    pub fallback: FallbackPolicy,
    pub timeout: Duration,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            fallback: FallbackPolicy::default(),
            timeout: time::secs_to_duration(DEFAULT_INFERENCE_TIMEOUT_SECS),
        }
    }
}

/// Chooses which synthetic species becomes the primary prediction
pub trait FallbackSelector: Send + Sync {
    /// Return an index in `0..candidates`
    fn select(&self, candidates: usize) -> usize;
}

/// Uniform random choice (production default)
#[derive(Debug, Default)]
pub struct UniformSelector;

impl FallbackSelector for UniformSelector {
    fn select(&self, candidates: usize) -> usize {
        rand::thread_rng().gen_range(0..candidates)
    }
}

/// Always the same index (wrapped into range)
#[derive(Debug, Clone, Copy)]
pub struct FixedSelector(pub usize);

impl FallbackSelector for FixedSelector {
    fn select(&self, candidates: usize) -> usize {
        self.0 % candidates
    }
}

/// Placeholder species used by the synthetic fallback
#[derive(Debug, Clone, Copy)]
pub struct SyntheticSpecies {
    pub species: &'static str,
    pub common_name: &'static str,
    pub scientific_name: &'static str,
    pub confidence: f64,
}

/// Fixed synthetic catalog, in selection order
pub const SYNTHETIC_SPECIES: [SyntheticSpecies; 4] = [
    SyntheticSpecies {
        species: "Chucao",
        common_name: "Chucao Tapaculo",
        scientific_name: "Scelorchilus rubecula",
        confidence: 0.92,
    },
    SyntheticSpecies {
        species: "Zorzal",
        common_name: "Austral Thrush",
        scientific_name: "Turdus falcklandii",
        confidence: 0.87,
    },
    SyntheticSpecies {
        species: "Diuca",
        common_name: "Common Diuca-Finch",
        scientific_name: "Diuca diuca",
        confidence: 0.85,
    },
    SyntheticSpecies {
        species: "Cachudito",
        common_name: "White-crested Elaenia",
        scientific_name: "Elaenia albiceps",
        confidence: 0.79,
    },
];

/// Prediction endpoint response body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelResponse {
    species: String,
    common_name: String,
    scientific_name: String,
    confidence: f64,
    #[serde(default)]
    alternatives: Option<Vec<AlternativePrediction>>,
}

/// HTTP client for the species prediction endpoint
pub struct InferenceClient {
    http_client: reqwest::Client,
    endpoint: Option<InferenceEndpoint>,
    fallback: FallbackPolicy,
    selector: Arc<dyn FallbackSelector>,
}

impl InferenceClient {
    pub fn new(settings: InferenceSettings) -> Result<Self, InferenceError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(settings.timeout)
            .build()
            .map_err(|e| InferenceError::Transport(e.to_string()))?;

        match &settings.endpoint {
            Some(endpoint) => tracing::info!(
                endpoint = %endpoint.url,
                credential = endpoint.api_key.is_some(),
                fallback = ?settings.fallback,
                timeout_secs = settings.timeout.as_secs(),
                "Inference endpoint configured"
            ),
            None => tracing::warn!(
                "Inference endpoint not configured. Predictions will use synthetic data."
            ),
        }

        Ok(Self {
            http_client,
            endpoint: settings.endpoint,
            fallback: settings.fallback,
            selector: Arc::new(UniformSelector),
        })
    }

    /// Replace the synthetic species selector
    pub fn with_selector(mut self, selector: Arc<dyn FallbackSelector>) -> Self {
        self.selector = selector;
        self
    }

    /// True when predictions go to a remote endpoint
    pub fn is_remote(&self) -> bool {
        self.endpoint.is_some()
    }

    pub fn fallback_policy(&self) -> FallbackPolicy {
        self.fallback
    }

    /// Build a synthetic prediction with the same shape as a genuine one
    pub fn synthetic_prediction(&self, audio_url: Option<&str>) -> PredictionRecord {
        let chosen = self.selector.select(SYNTHETIC_SPECIES.len());
        let primary = &SYNTHETIC_SPECIES[chosen];

        let alternatives = SYNTHETIC_SPECIES
            .iter()
            .filter(|candidate| candidate.species != primary.species)
            .take(SYNTHETIC_ALTERNATIVES)
            .map(|candidate| AlternativePrediction {
                species: candidate.common_name.to_string(),
                confidence: candidate.confidence,
            })
            .collect();

        tracing::debug!(species = primary.species, "Built synthetic prediction");

        PredictionRecord {
            id: ids::prediction_id(),
            species: primary.species.to_string(),
            common_name: primary.common_name.to_string(),
            scientific_name: primary.scientific_name.to_string(),
            confidence: primary.confidence,
            timestamp: time::iso_now(),
            alternative_predictions: Some(alternatives),
            audio_url: audio_url.map(str::to_string),
        }
    }

    /// POST the recording and decode the model's answer
    async fn request_prediction(
        &self,
        endpoint: &InferenceEndpoint,
        audio: &Bytes,
    ) -> Result<ModelResponse, InferenceError> {
        let part = multipart::Part::bytes(audio.to_vec())
            .file_name(AUDIO_FILENAME)
            .mime_str(AUDIO_CONTENT_TYPE)
            .map_err(|e| InferenceError::Transport(format!("mime: {}", e)))?;
        let form = multipart::Form::new().part(AUDIO_FIELD, part);

        let mut request = self.http_client.post(&endpoint.url).multipart(form);
        if let Some(api_key) = &endpoint.api_key {
            request = request.bearer_auth(api_key);
        }

        tracing::debug!(bytes = audio.len(), endpoint = %endpoint.url, "Sending audio to inference endpoint");

        let response = request
            .send()
            .await
            .map_err(|e| InferenceError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            truncate_on_char_boundary(&mut body, MAX_ERROR_BODY);
            return Err(InferenceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<ModelResponse>()
            .await
            .map_err(|e| InferenceError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl SpeciesPredictor for InferenceClient {
    async fn predict(
        &self,
        audio: &Bytes,
        audio_url: Option<&str>,
    ) -> Result<PredictionRecord, InferenceError> {
        let Some(endpoint) = &self.endpoint else {
            tracing::debug!("Using synthetic prediction - inference endpoint not configured");
            return Ok(self.synthetic_prediction(audio_url));
        };

        let outcome = self
            .request_prediction(endpoint, audio)
            .await
            .and_then(|response| into_record(response, audio_url));

        match outcome {
            Ok(record) => {
                tracing::info!(
                    species = %record.species,
                    confidence = record.confidence,
                    alternatives = record.alternatives().len(),
                    "Prediction received"
                );
                Ok(record)
            }
            Err(e) => match self.fallback {
                FallbackPolicy::Synthetic => {
                    tracing::warn!(
                        error = %e,
                        "Inference service unavailable, falling back to synthetic prediction"
                    );
                    Ok(self.synthetic_prediction(audio_url))
                }
                FallbackPolicy::Surface => {
                    tracing::error!(error = %e, "Inference service unavailable");
                    Err(e)
                }
            },
        }
    }
}

/// Convert a model response into a canonical record
///
/// Confidences must lie in [0, 1]. Alternatives naming the primary species
/// key (ignoring case) are dropped.
fn into_record(
    response: ModelResponse,
    audio_url: Option<&str>,
) -> Result<PredictionRecord, InferenceError> {
    if response.species.trim().is_empty() {
        return Err(InferenceError::Malformed("empty species key".to_string()));
    }
    check_confidence("confidence", response.confidence)?;

    let primary_key = species_key(&response.species);
    let alternative_predictions = match response.alternatives {
        Some(alternatives) => {
            let mut kept = Vec::with_capacity(alternatives.len());
            for alternative in alternatives {
                check_confidence("alternative confidence", alternative.confidence)?;
                if species_key(&alternative.species) == primary_key {
                    tracing::debug!(species = %alternative.species, "Dropping alternative that repeats the primary species");
                    continue;
                }
                kept.push(alternative);
            }
            Some(kept)
        }
        None => None,
    };

    Ok(PredictionRecord {
        id: ids::prediction_id(),
        species: response.species,
        common_name: response.common_name,
        scientific_name: response.scientific_name,
        confidence: response.confidence,
        timestamp: time::iso_now(),
        alternative_predictions,
        audio_url: audio_url.map(str::to_string),
    })
}

fn check_confidence(field: &str, value: f64) -> Result<(), InferenceError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(InferenceError::Malformed(format!(
            "{} {} outside [0, 1]",
            field, value
        )))
    }
}

fn truncate_on_char_boundary(text: &mut String, max: usize) {
    if text.len() <= max {
        return;
    }
    let mut cut = max;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
}
