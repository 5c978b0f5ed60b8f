//! # dxassist
//!
//! Diagnosis-support backend: patient records, a gradient-boosted disease
//! classifier trained on structured clinical features, and LLM-written
//! clinical narratives layered on top of its predictions.
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (patient records, predictions, narratives)
//! - `ml`: Feature encoding, boosting, training and model artifacts
//! - `ports`: Trait definitions for storage and narrative collaborators
//! - `adapters`: Concrete implementations (SQLite, chat-completions LLM, CSV/XLSX)
//! - `application`: Use cases orchestrating domain, model and ports
//! - `synthetic`: Reproducible labeled corpus generator
//! - `api`: HTTP surface

pub mod adapters;
pub mod api;
pub mod application;
pub mod config;
pub mod domain;
pub mod ml;
pub mod ports;
pub mod synthetic;

pub use config::Config;
pub use domain::{ClinicalProfile, DiagnosisRequest, PatientRecord, Prediction};

/// Result type for dxassist operations
pub type Result<T> = std::result::Result<T, DxError>;

/// Main error type for dxassist
#[derive(Debug, thiserror::Error)]
pub enum DxError {
    #[error("Need at least {need} labeled records to train. Currently have {have}.")]
    InsufficientData { have: usize, need: usize },

    #[error("ML model not trained yet. Please train the model first.")]
    ModelNotTrained,

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Narrative generation unavailable: {0}")]
    NarrativeUnavailable(#[from] ports::NarrativeError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Storage operation failed: {0}")]
    Storage(#[from] adapters::StorageError),

    #[error("Import failed: {0}")]
    Import(#[from] adapters::tabular::ImportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ml::ArtifactError> for DxError {
    fn from(err: ml::ArtifactError) -> Self {
        match err {
            ml::ArtifactError::Missing(_) | ml::ArtifactError::Corrupt(_) => {
                tracing::debug!("Model artifacts unusable: {}", err);
                Self::ModelNotTrained
            }
            ml::ArtifactError::Io(e) => Self::Io(e),
            ml::ArtifactError::Serialization(e) => Self::Serialization(e),
        }
    }
}
