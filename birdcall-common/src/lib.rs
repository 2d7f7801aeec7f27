//! # Birdcall Common Library
//!
//! Shared code for the birdcall services:
//! - Error type
//! - Bootstrap configuration loading (TOML + environment)
//! - Identifier and timestamp helpers

pub mod config;
pub mod error;
pub mod ids;
pub mod time;

pub use error::{Error, Result};
