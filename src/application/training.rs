//! Training service: fit on stored records, persist, swap the live model.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use super::prediction::PredictionService;
use crate::domain::PatientRecord;
use crate::ml::{self, BoostingParams, ModelBundle};
use crate::ports::Storage;
use crate::DxError;

/// Summary of a finished training run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingReport {
    pub accuracy: f64,
    pub n_classes: usize,
    pub classes: Vec<String>,
    /// Labeled records the run was given.
    pub n_samples: usize,
}

impl TrainingReport {
    fn new(bundle: &ModelBundle, n_samples: usize) -> Self {
        Self {
            accuracy: bundle.metadata.accuracy,
            n_classes: bundle.labels.len(),
            classes: bundle.labels.classes().to_vec(),
            n_samples,
        }
    }
}

/// Train on `records` and write the artifacts to `model_dir`.
///
/// Nothing is written when training fails.
///
/// # Errors
/// `InsufficientData` below the labeled-record minimum, `Io` if the
/// artifacts cannot be written.
pub fn train_and_save(
    records: &[PatientRecord],
    params: &BoostingParams,
    model_dir: &Path,
) -> crate::Result<(ModelBundle, TrainingReport)> {
    let n_samples = records.iter().filter(|r| r.label().is_some()).count();
    let bundle = ml::train(records, params)?;
    bundle.save(model_dir)?;
    let report = TrainingReport::new(&bundle, n_samples);
    Ok((bundle, report))
}

/// Retrains from storage and installs the result.
pub struct TrainingService<S>
where
    S: Storage,
{
    storage: Arc<S>,
    predictions: Arc<PredictionService>,
    params: BoostingParams,
}

impl<S> TrainingService<S>
where
    S: Storage,
    S::Error: Into<crate::adapters::StorageError>,
{
    pub fn new(storage: Arc<S>, predictions: Arc<PredictionService>, params: BoostingParams) -> Self {
        Self {
            storage,
            predictions,
            params,
        }
    }

    /// Train on every labeled stored record.
    ///
    /// # Errors
    /// `InsufficientData` below the minimum; storage and I/O failures.
    pub fn retrain(&self) -> crate::Result<TrainingReport> {
        let have = self
            .storage
            .count_labeled()
            .map_err(|e| DxError::Storage(e.into()))?;
        if have < ml::MIN_LABELED_RECORDS {
            return Err(DxError::InsufficientData {
                have,
                need: ml::MIN_LABELED_RECORDS,
            });
        }

        let records = self
            .storage
            .labeled_patients()
            .map_err(|e| DxError::Storage(e.into()))?;
        let (bundle, report) =
            train_and_save(&records, &self.params, self.predictions.model_dir())?;
        self.predictions.install(bundle);

        tracing::info!(
            "Retrained on {} records: {} classes, accuracy {:.4}",
            report.n_samples,
            report.n_classes,
            report.accuracy
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::SqliteStorage;
    use crate::domain::ClinicalProfile;

    fn records(n: usize) -> Vec<PatientRecord> {
        (0..n)
            .map(|i| {
                let (label, symptom) = if i % 2 == 0 {
                    ("Asthma", "wheezing")
                } else {
                    ("Migraine", "visual aura")
                };
                let mut r = PatientRecord::new(
                    "T",
                    "P",
                    ClinicalProfile {
                        age: 25,
                        symptoms: vec![symptom.into()],
                        ..Default::default()
                    },
                );
                r.diagnosis = Some(label.into());
                r
            })
            .collect()
    }

    fn params() -> BoostingParams {
        BoostingParams {
            n_rounds: 8,
            max_depth: 2,
            learning_rate: 0.3,
            min_child_weight: 0.1,
            ..Default::default()
        }
    }

    #[test]
    fn test_retrain_installs_model() {
        let dir = tempfile::tempdir().expect("Should create tempdir");
        let storage = Arc::new(SqliteStorage::in_memory().expect("Should create db"));
        storage.insert_patients(&records(60)).expect("Should save");
        let predictions = Arc::new(PredictionService::new(dir.path()));
        let service = TrainingService::new(storage, Arc::clone(&predictions), params());

        let report = service.retrain().expect("Should train");
        assert_eq!(report.n_samples, 60);
        assert_eq!(report.classes, vec!["Asthma", "Migraine"]);
        assert!(predictions.is_loaded());
        assert!(ModelBundle::load(dir.path()).is_ok());
    }

    #[test]
    fn test_retrain_below_minimum_writes_nothing() {
        let dir = tempfile::tempdir().expect("Should create tempdir");
        let storage = Arc::new(SqliteStorage::in_memory().expect("Should create db"));
        storage.insert_patients(&records(49)).expect("Should save");
        let predictions = Arc::new(PredictionService::new(dir.path()));
        let service = TrainingService::new(storage, Arc::clone(&predictions), params());

        assert!(matches!(
            service.retrain(),
            Err(DxError::InsufficientData { have: 49, need: 50 })
        ));
        assert!(!predictions.is_loaded());
        assert_eq!(
            std::fs::read_dir(dir.path()).expect("Should list").count(),
            0
        );
    }
}
