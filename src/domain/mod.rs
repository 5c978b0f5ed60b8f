//! Domain layer: Core business types.
//!
//! Pure Rust types with no I/O. All types are serializable; intake types
//! carry their own validation.

mod diagnosis;
mod image;
mod patient;

pub use diagnosis::{
    DiagnosisEntry, DiagnosisRequest, DiagnosisResult, Narrative, NarrativeSource, Prediction,
    RankedDiagnosis,
};
pub use image::{
    ImageAnalysis, ImageAnalysisEntry, ImageType, ALLOWED_IMAGE_EXTENSIONS, ALLOWED_IMAGE_TYPES,
    MAX_IMAGE_BYTES,
};
pub use patient::{
    BloodGroup, ClinicalProfile, Gender, LabResults, PatientRecord, Severity, StoredPatient,
    VitalSigns, LAB_FEATURES, VITAL_FEATURES,
};
