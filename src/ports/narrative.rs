//! Narrative port: language-model collaborators.
//!
//! Both traits are blocking; callers on an async runtime drive them from a
//! blocking task. Implementations make one attempt and never retry.

use thiserror::Error;

use crate::domain::{ClinicalProfile, ImageAnalysis, ImageType, Narrative, Prediction};

/// Why a collaborator produced no usable output.
#[derive(Debug, Error)]
pub enum NarrativeError {
    #[error("no API key configured")]
    NotConfigured,

    #[error("service unreachable: {0}")]
    Unreachable(String),

    #[error("request timed out")]
    Timeout,

    #[error("service returned HTTP {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Everything the narrative collaborator is told about a case.
#[derive(Debug, Clone, Copy)]
pub struct NarrativeRequest<'a> {
    pub prediction: &'a Prediction,
    pub patient: &'a ClinicalProfile,
}

/// Writes a clinical narrative for a prediction.
pub trait NarrativeGenerator: Send + Sync {
    /// # Errors
    /// Any failure; callers substitute [`Narrative::fallback`].
    fn generate(&self, request: NarrativeRequest<'_>) -> Result<Narrative, NarrativeError>;
}

/// Describes findings in a medical image.
pub trait ImageInterpreter: Send + Sync {
    /// # Errors
    /// Any failure; callers substitute [`ImageAnalysis::specialist_review`].
    fn interpret(
        &self,
        image: &[u8],
        mime_type: &str,
        image_type: ImageType,
    ) -> Result<ImageAnalysis, NarrativeError>;
}
