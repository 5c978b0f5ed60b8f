//! Prediction service: cached model handle and class ranking.
//!
//! The model is loaded from the model directory on first use and shared as
//! an `Arc<LoadedModel>`. Retraining installs a new handle; requests already
//! holding the old one finish on it.

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use crate::domain::{ClinicalProfile, Prediction, RankedDiagnosis};
use crate::ml::artifacts::MANIFEST_FILE;
use crate::ml::{FeatureEncoder, ModelBundle};
use crate::DxError;

/// Number of ranked classes returned with a prediction.
pub const TOP_K: usize = 5;

/// A trained model ready for inference.
#[derive(Debug)]
pub struct LoadedModel {
    bundle: ModelBundle,
    encoder: FeatureEncoder,
}

impl LoadedModel {
    #[must_use]
    pub fn new(bundle: ModelBundle) -> Self {
        let encoder = bundle.encoder();
        Self { bundle, encoder }
    }

    #[must_use]
    pub fn classes(&self) -> &[String] {
        self.bundle.labels.classes()
    }

    #[must_use]
    pub fn symptoms(&self) -> &[String] {
        self.encoder.symptoms()
    }

    /// Holdout accuracy recorded at training time.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        self.bundle.metadata.accuracy
    }

    /// Encode `profile` with the recorded layout and rank the classes.
    ///
    /// # Errors
    /// Returns `Encoding` if the classifier rejects the vector.
    pub fn predict(&self, profile: &ClinicalProfile) -> crate::Result<Prediction> {
        let features = self.encoder.encode(profile);
        let probabilities = self.bundle.classifier.predict_proba(&features)?;
        let top_predictions = rank_classes(&probabilities, self.classes(), TOP_K);
        let best = top_predictions
            .first()
            .cloned()
            .ok_or_else(|| DxError::Encoding("model produced no classes".into()))?;

        Ok(Prediction {
            predicted_disease: best.disease,
            confidence: best.confidence,
            top_predictions,
        })
    }
}

/// Probability as a percentage rounded to two decimals, within [0, 100].
#[must_use]
pub fn to_confidence(probability: f64) -> f64 {
    ((probability * 100.0 * 100.0).round() / 100.0).clamp(0.0, 100.0)
}

/// The `k` most probable classes, most probable first. Equal probabilities
/// keep class-index order.
#[must_use]
pub fn rank_classes(probabilities: &[f64], classes: &[String], k: usize) -> Vec<RankedDiagnosis> {
    let mut order: Vec<usize> = (0..probabilities.len().min(classes.len())).collect();
    order.sort_by(|&a, &b| probabilities[b].total_cmp(&probabilities[a]));
    order
        .into_iter()
        .take(k)
        .map(|i| RankedDiagnosis {
            disease: classes[i].clone(),
            confidence: to_confidence(probabilities[i]),
        })
        .collect()
}

/// Owns the process-wide model handle.
pub struct PredictionService {
    model_dir: PathBuf,
    current: RwLock<Option<Arc<LoadedModel>>>,
}

impl PredictionService {
    #[must_use]
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
            current: RwLock::new(None),
        }
    }

    #[must_use]
    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    /// The cached model, loading it from disk if none is cached.
    ///
    /// # Errors
    /// `ModelNotTrained` if no complete artifact set is on disk.
    pub fn model(&self) -> crate::Result<Arc<LoadedModel>> {
        if let Some(model) = self.cached() {
            return Ok(model);
        }

        let mut slot = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(model) = slot.as_ref() {
            return Ok(Arc::clone(model));
        }

        let bundle = ModelBundle::load(&self.model_dir)?;
        tracing::info!(
            "Model loaded: {} classes, accuracy {:.4}",
            bundle.labels.len(),
            bundle.metadata.accuracy
        );
        let model = Arc::new(LoadedModel::new(bundle));
        *slot = Some(Arc::clone(&model));
        Ok(model)
    }

    /// The cached model without touching disk.
    #[must_use]
    pub fn cached(&self) -> Option<Arc<LoadedModel>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The cached model, or one loaded from disk when a complete artifact
    /// set exists. Never retries a load while the directory has no manifest.
    #[must_use]
    pub fn available(&self) -> Option<Arc<LoadedModel>> {
        if let Some(model) = self.cached() {
            return Some(model);
        }
        if !self.model_dir.join(MANIFEST_FILE).exists() {
            return None;
        }
        self.model().ok()
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.cached().is_some()
    }

    /// Load at startup if possible. Returns whether a model is available.
    pub fn preload(&self) -> bool {
        match self.model() {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("No model loaded at startup: {}", e);
                false
            }
        }
    }

    /// Replace the cached model with a freshly trained one.
    pub fn install(&self, bundle: ModelBundle) -> Arc<LoadedModel> {
        let model = Arc::new(LoadedModel::new(bundle));
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&model));
        tracing::info!("Installed model with {} classes", model.classes().len());
        model
    }

    /// Predict with the cached model.
    ///
    /// # Errors
    /// `ModelNotTrained` when no model exists.
    pub fn predict(&self, profile: &ClinicalProfile) -> crate::Result<Prediction> {
        self.model()?.predict(profile)
    }
}
