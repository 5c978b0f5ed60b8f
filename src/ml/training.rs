//! Offline training pipeline.

use super::artifacts::ModelBundle;
use super::encoder::{FeatureEncoder, ModelMetadata};
use super::gbdt::{BoostingParams, GradientBoostedClassifier};
use super::labels::LabelEncoder;
use super::split::stratified_split;
use crate::domain::PatientRecord;
use crate::DxError;

/// Fewest labeled records a training run accepts.
pub const MIN_LABELED_RECORDS: usize = 50;

/// Share of each class held out for evaluation.
pub const TEST_FRACTION: f64 = 0.2;

/// Seed of the train/test split.
pub const SPLIT_SEED: u64 = 42;

/// Fit a classifier on the labeled subset of `records`.
///
/// Records without a non-blank diagnosis are skipped. Nothing is written to
/// disk; persist the returned bundle with [`ModelBundle::save`].
///
/// # Errors
/// Returns `InsufficientData` below [`MIN_LABELED_RECORDS`] labeled records.
pub fn train(records: &[PatientRecord], params: &BoostingParams) -> crate::Result<ModelBundle> {
    let labeled: Vec<(&PatientRecord, &str)> = records
        .iter()
        .filter_map(|r| r.label().map(|label| (r, label)))
        .collect();

    if labeled.len() < MIN_LABELED_RECORDS {
        return Err(DxError::InsufficientData {
            have: labeled.len(),
            need: MIN_LABELED_RECORDS,
        });
    }

    tracing::info!("Training on {} labeled records", labeled.len());

    let encoder = FeatureEncoder::builtin();
    let x: Vec<Vec<f64>> = labeled
        .iter()
        .map(|(r, _)| encoder.encode(&r.clinical))
        .collect();
    tracing::debug!("Feature matrix shape: ({}, {})", x.len(), encoder.len());

    let labels = LabelEncoder::fit(labeled.iter().map(|(_, label)| *label));
    let y: Vec<usize> = labeled
        .iter()
        .map(|(_, label)| {
            labels
                .transform(label)
                .ok_or_else(|| DxError::Encoding(format!("label {label} missing from encoder")))
        })
        .collect::<crate::Result<_>>()?;
    tracing::info!("Number of disease classes: {}", labels.len());

    let split = stratified_split(&y, TEST_FRACTION, SPLIT_SEED);
    let x_train: Vec<Vec<f64>> = split.train.iter().map(|&i| x[i].clone()).collect();
    let y_train: Vec<usize> = split.train.iter().map(|&i| y[i]).collect();

    let classifier = GradientBoostedClassifier::fit(&x_train, &y_train, labels.len(), params)?;

    let accuracy = if split.test.is_empty() {
        tracing::warn!("Holdout set is empty; reporting accuracy 0");
        0.0
    } else {
        let mut correct = 0usize;
        for &i in &split.test {
            if classifier.predict(&x[i])? == y[i] {
                correct += 1;
            }
        }
        correct as f64 / split.test.len() as f64
    };
    tracing::info!(
        "Test accuracy: {:.4} ({} train / {} test rows)",
        accuracy,
        split.train.len(),
        split.test.len()
    );

    let metadata = ModelMetadata::new(&encoder, labels.classes().to_vec(), accuracy);
    log_top_features(&classifier, &metadata.feature_names);

    Ok(ModelBundle {
        classifier,
        labels,
        metadata,
    })
}

fn log_top_features(classifier: &GradientBoostedClassifier, names: &[String]) {
    let mut ranked: Vec<(usize, f64)> = classifier
        .feature_importance()
        .into_iter()
        .enumerate()
        .filter(|(_, v)| *v > 0.0)
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    for (i, importance) in ranked.into_iter().take(10) {
        let name = names.get(i).map_or("?", String::as_str);
        tracing::debug!("Feature importance {}: {:.4}", name, importance);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClinicalProfile, Gender};

    fn record(label: Option<&str>, symptom: &str, age: u32) -> PatientRecord {
        let mut r = PatientRecord::new(
            "Test",
            "Patient",
            ClinicalProfile {
                age,
                gender: Gender::Female,
                symptoms: vec![symptom.to_string()],
                ..Default::default()
            },
        );
        r.diagnosis = label.map(str::to_string);
        r
    }

    fn params() -> BoostingParams {
        BoostingParams {
            n_rounds: 15,
            max_depth: 3,
            learning_rate: 0.3,
            min_child_weight: 0.1,
            ..Default::default()
        }
    }

    #[test]
    fn test_insufficient_data() {
        let records: Vec<_> = (0..49).map(|i| record(Some("Asthma"), "wheezing", i)).collect();
        match train(&records, &params()) {
            Err(DxError::InsufficientData { have, need }) => {
                assert_eq!(have, 49);
                assert_eq!(need, 50);
            }
            other => panic!("expected InsufficientData, got {other:?}"),
        }
    }

    #[test]
    fn test_unlabeled_records_do_not_count() {
        let mut records: Vec<_> = (0..49).map(|i| record(Some("Asthma"), "wheezing", i)).collect();
        records.push(record(None, "wheezing", 30));
        records.push(record(Some(" "), "wheezing", 30));
        assert!(matches!(
            train(&records, &params()),
            Err(DxError::InsufficientData { have: 49, .. })
        ));
    }

    #[test]
    fn test_train_learns_symptom_signal() {
        let records: Vec<_> = (0..60)
            .map(|i| {
                if i % 2 == 0 {
                    record(Some("Asthma"), "wheezing", 20 + i % 40)
                } else {
                    record(Some("Migraine"), "visual aura", 20 + i % 40)
                }
            })
            .collect();

        let bundle = train(&records, &params()).expect("Should train");
        assert_eq!(bundle.metadata.classes, vec!["Asthma", "Migraine"]);
        assert_eq!(bundle.metadata.n_features, FeatureEncoder::builtin().len());
        assert!((bundle.metadata.accuracy - 1.0).abs() < f64::EPSILON);

        let encoder = FeatureEncoder::from_metadata(&bundle.metadata);
        let probe = record(None, "visual aura", 33);
        let class = bundle
            .classifier
            .predict(&encoder.encode(&probe.clinical))
            .expect("Should predict");
        assert_eq!(bundle.labels.inverse(class), Some("Migraine"));
    }
}
