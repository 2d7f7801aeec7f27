//! Test Helper Utilities
//!
//! Shared utilities for testing birdcall-id

#![allow(dead_code)]

pub mod audio;
pub mod doubles;
pub mod multipart;
pub mod upstream;

pub use audio::{chirp_wav, short_call};
pub use doubles::{
    chucao_fact, prediction, seeded_catalog, CountingCatalog, CountingPredictor, FailingStore,
    UnavailablePredictor,
};
pub use multipart::{body_json, identify_request, MultipartBody};
pub use upstream::{
    closed_port_url, prediction_body, spawn_upstream, spawn_upstream_with_delay, StubUpstream,
};
