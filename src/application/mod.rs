//! Application layer: Use cases and services.
//!
//! Services are synchronous and generic over the storage port. Long-lived
//! instances are shared through `Arc` by the HTTP layer.

mod data;
pub(crate) mod diagnosis;
mod imaging;
mod import;
mod patients;
mod prediction;
mod training;

pub use data::{DataService, SeedOutcome};
pub use diagnosis::DiagnosisService;
pub use imaging::{accepted_mime, ImagingService};
pub use import::{ImportReport, ImportService, RowError, RowOutcome, RowPrediction};
pub use patients::{age_histogram, PatientService, PatientStats, AGE_BOUNDARIES};
pub use prediction::{rank_classes, to_confidence, LoadedModel, PredictionService, TOP_K};
pub use training::{train_and_save, TrainingReport, TrainingService};
