//! On-disk model artifacts.
//!
//! A model directory holds three JSON artifacts plus `manifest.json`, which
//! binds each artifact to its SHA-256. The manifest is written last and
//! removed first, so a directory whose manifest verifies always holds one
//! complete training run.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::encoder::{FeatureEncoder, ModelMetadata};
use super::gbdt::GradientBoostedClassifier;
use super::labels::LabelEncoder;

pub const CLASSIFIER_FILE: &str = "classifier.json";
pub const LABELS_FILE: &str = "label_encoder.json";
pub const METADATA_FILE: &str = "model_meta.json";
pub const MANIFEST_FILE: &str = "manifest.json";

const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Model artifact missing: {0}")]
    Missing(PathBuf),
    #[error("Model artifacts are inconsistent: {0}")]
    Corrupt(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct Manifest {
    version: u32,
    created_at: i64,
    files: BTreeMap<String, String>,
}

/// A trained classifier with the label mapping and feature layout it was
/// trained against.
#[derive(Debug, Clone)]
pub struct ModelBundle {
    pub classifier: GradientBoostedClassifier,
    pub labels: LabelEncoder,
    pub metadata: ModelMetadata,
}

impl ModelBundle {
    /// Encoder matching the layout this model was trained on.
    #[must_use]
    pub fn encoder(&self) -> FeatureEncoder {
        FeatureEncoder::from_metadata(&self.metadata)
    }

    /// Cross-check the three artifacts against each other.
    ///
    /// # Errors
    /// Returns `Corrupt` describing the first mismatch.
    pub fn check(&self) -> Result<(), ArtifactError> {
        self.metadata.check().map_err(ArtifactError::Corrupt)?;
        self.classifier.check().map_err(ArtifactError::Corrupt)?;
        if self.labels.classes() != self.metadata.classes.as_slice() {
            return Err(ArtifactError::Corrupt(
                "label encoder classes differ from metadata classes".into(),
            ));
        }
        if self.classifier.n_classes() != self.labels.len() {
            return Err(ArtifactError::Corrupt(format!(
                "classifier has {} classes, label encoder has {}",
                self.classifier.n_classes(),
                self.labels.len()
            )));
        }
        if self.classifier.n_features() != self.metadata.n_features {
            return Err(ArtifactError::Corrupt(format!(
                "classifier expects {} features, metadata records {}",
                self.classifier.n_features(),
                self.metadata.n_features
            )));
        }
        Ok(())
    }

    /// Write all artifacts into `dir`, creating it if needed.
    ///
    /// # Errors
    /// Returns `Io`/`Serialization` on write failure. A failed save leaves
    /// the directory without a manifest, which later loads treat as missing.
    pub fn save(&self, dir: &Path) -> Result<(), ArtifactError> {
        self.check()?;
        fs::create_dir_all(dir)?;

        match fs::remove_file(dir.join(MANIFEST_FILE)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let mut files = BTreeMap::new();
        for (name, bytes) in [
            (CLASSIFIER_FILE, serde_json::to_vec(&self.classifier)?),
            (LABELS_FILE, serde_json::to_vec_pretty(&self.labels)?),
            (METADATA_FILE, serde_json::to_vec_pretty(&self.metadata)?),
        ] {
            write_replacing(&dir.join(name), &bytes)?;
            files.insert(name.to_string(), sha256_hex(&bytes));
        }

        let manifest = Manifest {
            version: MANIFEST_VERSION,
            created_at: chrono::Utc::now().timestamp(),
            files,
        };
        write_replacing(&dir.join(MANIFEST_FILE), &serde_json::to_vec_pretty(&manifest)?)?;

        tracing::info!("Model artifacts saved to {}", dir.display());
        Ok(())
    }

    /// Load and verify the artifacts in `dir`.
    ///
    /// # Errors
    /// `Missing` if the manifest or an artifact is absent, `Corrupt` if a
    /// hash or cross-check fails.
    pub fn load(dir: &Path) -> Result<Self, ArtifactError> {
        let manifest_path = dir.join(MANIFEST_FILE);
        let manifest: Manifest = serde_json::from_slice(&read_required(&manifest_path)?)
            .map_err(|e| ArtifactError::Corrupt(format!("invalid manifest: {e}")))?;
        if manifest.version != MANIFEST_VERSION {
            return Err(ArtifactError::Corrupt(format!(
                "unsupported manifest version {}",
                manifest.version
            )));
        }

        let bundle = Self {
            classifier: read_verified(dir, &manifest, CLASSIFIER_FILE)?,
            labels: read_verified(dir, &manifest, LABELS_FILE)?,
            metadata: read_verified(dir, &manifest, METADATA_FILE)?,
        };
        bundle.check()?;

        tracing::debug!(
            "Loaded model with {} classes and {} features from {}",
            bundle.labels.len(),
            bundle.metadata.n_features,
            dir.display()
        );
        Ok(bundle)
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn write_replacing(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)
}

fn read_required(path: &Path) -> Result<Vec<u8>, ArtifactError> {
    fs::read(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            ArtifactError::Missing(path.to_path_buf())
        } else {
            ArtifactError::Io(e)
        }
    })
}

fn read_verified<T: DeserializeOwned>(
    dir: &Path,
    manifest: &Manifest,
    name: &str,
) -> Result<T, ArtifactError> {
    let expected = manifest
        .files
        .get(name)
        .ok_or_else(|| ArtifactError::Corrupt(format!("manifest does not list {name}")))?;
    let bytes = read_required(&dir.join(name))?;
    if sha256_hex(&bytes) != *expected {
        return Err(ArtifactError::Corrupt(format!("hash mismatch for {name}")));
    }
    serde_json::from_slice(&bytes).map_err(|e| ArtifactError::Corrupt(format!("{name}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::gbdt::BoostingParams;

    fn tiny_bundle() -> ModelBundle {
        let encoder = FeatureEncoder::builtin();
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..20 {
            let mut row = vec![0.0; encoder.len()];
            row[0] = f64::from(i);
            x.push(row);
            y.push(usize::from(i >= 10));
        }
        let params = BoostingParams {
            n_rounds: 3,
            max_depth: 2,
            min_child_weight: 0.1,
            ..Default::default()
        };
        let classifier = GradientBoostedClassifier::fit(&x, &y, 2, &params).expect("Should fit");
        let labels = LabelEncoder::fit(["Asthma", "Malaria"]);
        let metadata = ModelMetadata::new(&encoder, labels.classes().to_vec(), 0.75);
        ModelBundle {
            classifier,
            labels,
            metadata,
        }
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().expect("Should create tempdir");
        let bundle = tiny_bundle();
        bundle.save(dir.path()).expect("Should save");

        for name in [CLASSIFIER_FILE, LABELS_FILE, METADATA_FILE, MANIFEST_FILE] {
            assert!(dir.path().join(name).exists(), "{name} missing");
        }

        let loaded = ModelBundle::load(dir.path()).expect("Should load");
        assert_eq!(loaded.labels, bundle.labels);
        assert_eq!(loaded.metadata, bundle.metadata);
        let row = vec![0.0; bundle.metadata.n_features];
        assert_eq!(
            loaded.classifier.predict_proba(&row).expect("Should predict"),
            bundle.classifier.predict_proba(&row).expect("Should predict")
        );
    }

    #[test]
    fn test_empty_dir_is_missing() {
        let dir = tempfile::tempdir().expect("Should create tempdir");
        assert!(matches!(
            ModelBundle::load(dir.path()),
            Err(ArtifactError::Missing(_))
        ));
    }

    #[test]
    fn test_tampered_artifact_is_corrupt() {
        let dir = tempfile::tempdir().expect("Should create tempdir");
        tiny_bundle().save(dir.path()).expect("Should save");

        let path = dir.path().join(LABELS_FILE);
        let tampered = r#"{"classes":["Asthma","Zika"]}"#;
        fs::write(&path, tampered).expect("Should write");

        assert!(matches!(
            ModelBundle::load(dir.path()),
            Err(ArtifactError::Corrupt(_))
        ));
    }

    #[test]
    fn test_deleted_artifact_is_missing() {
        let dir = tempfile::tempdir().expect("Should create tempdir");
        tiny_bundle().save(dir.path()).expect("Should save");
        fs::remove_file(dir.path().join(CLASSIFIER_FILE)).expect("Should remove");

        assert!(matches!(
            ModelBundle::load(dir.path()),
            Err(ArtifactError::Missing(_))
        ));
    }

    #[test]
    fn test_check_rejects_mismatched_labels() {
        let mut bundle = tiny_bundle();
        bundle.labels = LabelEncoder::fit(["Asthma", "COPD", "Malaria"]);
        assert!(matches!(bundle.check(), Err(ArtifactError::Corrupt(_))));
    }
}
