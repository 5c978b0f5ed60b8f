//! Disease classifier: features, boosting, training and persistence.

pub mod artifacts;
pub mod encoder;
pub mod gbdt;
pub mod labels;
pub mod split;
pub mod training;
pub mod vocabulary;

pub use artifacts::{ArtifactError, ModelBundle};
pub use encoder::{FeatureEncoder, ModelMetadata};
pub use gbdt::{BoostingParams, GradientBoostedClassifier};
pub use labels::LabelEncoder;
pub use training::{train, MIN_LABELED_RECORDS};
pub use vocabulary::SYMPTOM_VOCABULARY;
