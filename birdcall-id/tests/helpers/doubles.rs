//! Counting collaborator doubles and fixtures

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use birdcall_id::db::{init_catalog_pool, SqliteCatalog};
use birdcall_id::models::{AudioSubmission, PredictionRecord, ReferenceFact};
use birdcall_id::types::{
    AudioStore, CatalogError, InferenceError, ReferenceCatalog, SpeciesPredictor, StorageError,
};

/// Prediction record for `species`, as a model would produce it
pub fn prediction(species: &str) -> PredictionRecord {
    PredictionRecord {
        id: birdcall_common::ids::prediction_id(),
        species: species.to_string(),
        common_name: format!("{} common", species),
        scientific_name: format!("{} scientificus", species),
        confidence: 0.9,
        timestamp: birdcall_common::time::iso_now(),
        alternative_predictions: Some(Vec::new()),
        audio_url: None,
    }
}

/// Catalog entry for the Chucao tapaculo
pub fn chucao_fact() -> ReferenceFact {
    ReferenceFact {
        species: "Chucao".to_string(),
        common_name: "Chucao Tapaculo".to_string(),
        scientific_name: "Scelorchilus rubecula".to_string(),
        image: "https://img.example/chucao.jpg".to_string(),
        size: "17-19 cm".to_string(),
        weight: "40 g".to_string(),
        colors: "Rufous throat and breast, barred flanks".to_string(),
        habitat: "Dense understory of temperate forest".to_string(),
    }
}

/// In-memory SQLite catalog holding the Chucao entry
pub async fn seeded_catalog() -> SqliteCatalog {
    let pool = init_catalog_pool("sqlite::memory:").await.unwrap();
    let catalog = SqliteCatalog::new(pool);
    catalog.seed_facts(&[chucao_fact()]).await.unwrap();
    catalog
}

/// Predictor returning a fixed species and counting calls
pub struct CountingPredictor {
    species: String,
    calls: AtomicUsize,
    last_audio_url: Mutex<Option<String>>,
}

impl CountingPredictor {
    pub fn new(species: &str) -> Arc<Self> {
        Arc::new(Self {
            species: species.to_string(),
            calls: AtomicUsize::new(0),
            last_audio_url: Mutex::new(None),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_audio_url(&self) -> Option<String> {
        self.last_audio_url.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeciesPredictor for CountingPredictor {
    async fn predict(
        &self,
        _audio: &Bytes,
        audio_url: Option<&str>,
    ) -> Result<PredictionRecord, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_audio_url.lock().unwrap() = audio_url.map(str::to_string);

        let mut record = prediction(&self.species);
        record.audio_url = audio_url.map(str::to_string);
        Ok(record)
    }
}

/// Predictor that always fails (surface policy behaviour)
pub struct UnavailablePredictor;

#[async_trait]
impl SpeciesPredictor for UnavailablePredictor {
    async fn predict(
        &self,
        _audio: &Bytes,
        _audio_url: Option<&str>,
    ) -> Result<PredictionRecord, InferenceError> {
        Err(InferenceError::Status {
            status: 503,
            body: "model warming up".to_string(),
        })
    }
}

/// Catalog wrapper counting lookups
pub struct CountingCatalog {
    inner: SqliteCatalog,
    lookups: AtomicUsize,
}

impl CountingCatalog {
    pub async fn seeded() -> Arc<Self> {
        Arc::new(Self {
            inner: seeded_catalog().await,
            lookups: AtomicUsize::new(0),
        })
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReferenceCatalog for CountingCatalog {
    async fn lookup(&self, species: &str) -> Result<ReferenceFact, CatalogError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.lookup(species).await
    }

    async fn list_all(&self) -> Result<Vec<ReferenceFact>, CatalogError> {
        self.inner.list_all().await
    }
}

/// Store whose uploads always fail
#[derive(Default)]
pub struct FailingStore {
    attempts: AtomicUsize,
}

impl FailingStore {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioStore for FailingStore {
    async fn upload(&self, _submission: &AudioSubmission) -> Result<String, StorageError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(StorageError::Upload("container is read-only".to_string()))
    }

    async fn delete(&self, url: &str) -> Result<(), StorageError> {
        Err(StorageError::Delete(url.to_string()))
    }
}
