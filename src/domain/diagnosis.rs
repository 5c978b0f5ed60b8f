//! Prediction and diagnosis result types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::patient::ClinicalProfile;

/// One ranked class from the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedDiagnosis {
    pub disease: String,

    /// Probability scaled to percent, rounded to 2 decimals.
    pub confidence: f64,
}

/// Output of the prediction service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub predicted_disease: String,
    pub confidence: f64,
    /// Up to five classes, most probable first.
    pub top_predictions: Vec<RankedDiagnosis>,
}

/// Structured clinical explanation attached to a prediction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Narrative {
    pub ai_suggestion: String,
    pub root_cause: String,
    #[serde(default)]
    pub recommended_tests: Vec<String>,
    #[serde(default)]
    pub recommended_treatments: Vec<String>,
    #[serde(default)]
    pub red_flags: Vec<String>,
    #[serde(default)]
    pub differential_notes: String,
}

/// Percentage as shown to users: whole values keep one decimal (`92.0`),
/// others print in full (`92.35`).
fn percent_text(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

impl Narrative {
    /// Templated narrative derived only from the prediction.
    #[must_use]
    pub fn fallback(prediction: &Prediction) -> Self {
        Self {
            ai_suggestion: format!(
                "ML model predicts {} with {}% confidence. Please consult with specialists for detailed analysis.",
                prediction.predicted_disease,
                percent_text(prediction.confidence)
            ),
            root_cause: "Unable to generate AI analysis. Please review patient data manually."
                .to_string(),
            recommended_tests: Vec::new(),
            recommended_treatments: Vec::new(),
            red_flags: Vec::new(),
            differential_notes: String::new(),
        }
    }
}

/// Where the narrative of a diagnosis came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NarrativeSource {
    Llm,
    Fallback,
}

/// Input to the diagnosis orchestrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiagnosisRequest {
    /// Stored patient to update with the outcome (opaque id or `patient_id`).
    #[serde(default)]
    pub patient_id: Option<String>,

    #[serde(flatten)]
    pub clinical: ClinicalProfile,
}

/// Prediction merged with its narrative, as returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosisResult {
    #[serde(flatten)]
    pub prediction: Prediction,

    #[serde(flatten)]
    pub narrative: Narrative,

    pub narrative_source: NarrativeSource,
}

/// Append-only history entry written by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosisEntry {
    pub id: String,

    #[serde(default)]
    pub patient_id: Option<String>,

    pub input: ClinicalProfile,

    #[serde(flatten)]
    pub result: DiagnosisResult,

    pub created_at: DateTime<Utc>,
}

impl DiagnosisEntry {
    #[must_use]
    pub fn new(request: &DiagnosisRequest, result: DiagnosisResult) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id: request.patient_id.clone(),
            input: request.clinical.clone(),
            result,
            created_at: Utc::now(),
        }
    }
}
