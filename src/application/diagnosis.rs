//! Diagnosis orchestrator: prediction, narrative, history.

use std::sync::Arc;

use chrono::Utc;

use super::prediction::PredictionService;
use crate::domain::{
    DiagnosisEntry, DiagnosisRequest, DiagnosisResult, Narrative, NarrativeSource, Prediction,
};
use crate::ports::{NarrativeGenerator, NarrativeRequest, Storage};
use crate::DxError;

/// Runs one diagnosis end to end.
///
/// Narrative failures never fail a diagnosis; the templated fallback is used
/// instead. History writes are best-effort.
pub struct DiagnosisService<S>
where
    S: Storage,
{
    storage: Arc<S>,
    predictions: Arc<PredictionService>,
    narrator: Arc<dyn NarrativeGenerator>,
}

impl<S> DiagnosisService<S>
where
    S: Storage,
    S::Error: Into<crate::adapters::StorageError>,
{
    pub fn new(
        storage: Arc<S>,
        predictions: Arc<PredictionService>,
        narrator: Arc<dyn NarrativeGenerator>,
    ) -> Self {
        Self {
            storage,
            predictions,
            narrator,
        }
    }

    /// Predict, explain and record.
    ///
    /// # Errors
    /// `Validation` for malformed input, `ModelNotTrained` when no model
    /// exists. No history is written in either case.
    pub fn diagnose(&self, request: &DiagnosisRequest) -> crate::Result<DiagnosisResult> {
        request
            .clinical
            .validate()
            .map_err(|errors| DxError::Validation(errors.join("; ")))?;

        let prediction = self.predictions.predict(&request.clinical)?;
        tracing::info!(
            "Predicted {} ({:.2}%)",
            prediction.predicted_disease,
            prediction.confidence
        );

        let (narrative, narrative_source) = self.narrate(&prediction, request);
        let result = DiagnosisResult {
            prediction,
            narrative,
            narrative_source,
        };

        let entry = DiagnosisEntry::new(request, result.clone());
        if let Err(e) = self.storage.append_diagnosis(&entry) {
            tracing::warn!("Failed to save diagnosis history: {:?}", e);
        }

        if let Some(id) = request.patient_id.as_deref() {
            self.update_patient(id, &result);
        }

        Ok(result)
    }

    fn narrate(
        &self,
        prediction: &Prediction,
        request: &DiagnosisRequest,
    ) -> (Narrative, NarrativeSource) {
        let outcome = self.narrator.generate(NarrativeRequest {
            prediction,
            patient: &request.clinical,
        });
        match outcome {
            Ok(narrative) => (narrative, NarrativeSource::Llm),
            Err(e) => {
                let err = DxError::NarrativeUnavailable(e);
                tracing::warn!("{}; using fallback narrative", err);
                (Narrative::fallback(prediction), NarrativeSource::Fallback)
            }
        }
    }

    fn update_patient(&self, id: &str, result: &DiagnosisResult) {
        let found = match self.storage.find_patient(id) {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!("Failed to look up patient for diagnosis: {:?}", e);
                return;
            }
        };
        let Some(mut patient) = found else {
            tracing::warn!("Diagnosis names unknown patient; record not updated");
            return;
        };

        let record = &mut patient.record;
        record.diagnosis = Some(result.prediction.predicted_disease.clone());
        record.confidence = Some(result.prediction.confidence);
        record.ai_suggestion = Some(result.narrative.ai_suggestion.clone());
        record.root_cause = Some(result.narrative.root_cause.clone());
        record.updated_at = Some(Utc::now());

        if let Err(e) = self.storage.update_patient(&patient) {
            tracing::warn!("Failed to update patient with diagnosis: {:?}", e);
        }
    }

    /// Page through recorded diagnoses, newest first.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    pub fn history(
        &self,
        page: usize,
        limit: usize,
    ) -> crate::Result<crate::ports::Page<DiagnosisEntry>> {
        self.storage
            .diagnosis_history(page, limit)
            .map_err(|e| DxError::Storage(e.into()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::adapters::sqlite::SqliteStorage;
    use crate::domain::{ClinicalProfile, PatientRecord};
    use crate::ml::{BoostingParams, ModelBundle};
    use crate::ports::NarrativeError;
    use std::sync::Mutex;

    /// Narrator returning a canned narrative, or failing.
    pub(crate) struct MockNarrator {
        pub reply: Option<Narrative>,
        pub calls: Mutex<usize>,
    }

    impl NarrativeGenerator for MockNarrator {
        fn generate(&self, _request: NarrativeRequest<'_>) -> Result<Narrative, NarrativeError> {
            *self.calls.lock().expect("Lock failed") += 1;
            self.reply
                .clone()
                .ok_or_else(|| NarrativeError::Unreachable("mock".into()))
        }
    }

    fn record(label: &str, symptom: &str) -> PatientRecord {
        let mut r = PatientRecord::new(
            "Test",
            "Patient",
            ClinicalProfile {
                age: 30,
                symptoms: vec![symptom.to_string()],
                ..Default::default()
            },
        );
        r.diagnosis = Some(label.to_string());
        r
    }

    /// Two-class model separating wheezing from visual aura.
    pub(crate) fn small_bundle() -> ModelBundle {
        let records: Vec<_> = (0..60)
            .map(|i| {
                if i % 2 == 0 {
                    record("Asthma", "wheezing")
                } else {
                    record("Migraine", "visual aura")
                }
            })
            .collect();
        let params = BoostingParams {
            n_rounds: 10,
            max_depth: 2,
            learning_rate: 0.3,
            min_child_weight: 0.1,
            ..Default::default()
        };
        crate::ml::train(&records, &params).expect("Should train")
    }

    fn service(
        reply: Option<Narrative>,
    ) -> (DiagnosisService<SqliteStorage>, Arc<SqliteStorage>, Arc<MockNarrator>) {
        let storage = Arc::new(SqliteStorage::in_memory().expect("Should create db"));
        let predictions = Arc::new(PredictionService::new("unused-model-dir"));
        predictions.install(small_bundle());
        let narrator = Arc::new(MockNarrator {
            reply,
            calls: Mutex::new(0),
        });
        let svc = DiagnosisService::new(Arc::clone(&storage), predictions, narrator.clone());
        (svc, storage, narrator)
    }

    fn request(symptom: &str) -> DiagnosisRequest {
        DiagnosisRequest {
            patient_id: None,
            clinical: ClinicalProfile {
                age: 30,
                symptoms: vec![symptom.to_string()],
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_llm_narrative_is_used() {
        let reply = Narrative {
            ai_suggestion: "Likely migraine with aura".into(),
            root_cause: "Cortical spreading depression".into(),
            ..Default::default()
        };
        let (svc, storage, narrator) = service(Some(reply.clone()));

        let result = svc.diagnose(&request("visual aura")).expect("Should diagnose");
        assert_eq!(result.prediction.predicted_disease, "Migraine");
        assert_eq!(result.narrative, reply);
        assert_eq!(result.narrative_source, NarrativeSource::Llm);
        assert_eq!(*narrator.calls.lock().expect("Lock failed"), 1);
        assert_eq!(storage.diagnosis_history(1, 10).expect("Should load").total, 1);
    }

    #[test]
    fn test_failed_narrator_falls_back() {
        let (svc, _storage, _) = service(None);

        let result = svc.diagnose(&request("wheezing")).expect("Should diagnose");
        assert_eq!(result.prediction.predicted_disease, "Asthma");
        assert_eq!(result.narrative_source, NarrativeSource::Fallback);
        assert_eq!(result.narrative, Narrative::fallback(&result.prediction));

        let history = svc.history(1, 10).expect("Should load");
        assert_eq!(history.items[0].result.narrative_source, NarrativeSource::Fallback);
    }

    #[test]
    fn test_untrained_model_writes_no_history() {
        let storage = Arc::new(SqliteStorage::in_memory().expect("Should create db"));
        let dir = tempfile::tempdir().expect("Should create tempdir");
        let svc = DiagnosisService::new(
            Arc::clone(&storage),
            Arc::new(PredictionService::new(dir.path())),
            Arc::new(MockNarrator {
                reply: None,
                calls: Mutex::new(0),
            }),
        );
        assert!(matches!(
            svc.diagnose(&request("wheezing")),
            Err(DxError::ModelNotTrained)
        ));
        assert_eq!(storage.diagnosis_history(1, 10).expect("Should load").total, 0);
    }

    #[test]
    fn test_named_patient_is_updated() {
        let (svc, storage, _) = service(None);
        let mut patient = record("Unknown", "wheezing");
        patient.diagnosis = None;
        patient.patient_id = Some("EP00007".into());
        let stored = storage.insert_patient(&patient).expect("Should save");

        let mut req = request("wheezing");
        req.patient_id = Some("EP00007".into());
        svc.diagnose(&req).expect("Should diagnose");

        let reread = storage
            .find_patient(&stored.id)
            .expect("Should query")
            .expect("Should exist");
        assert_eq!(reread.record.diagnosis.as_deref(), Some("Asthma"));
        assert!(reread.record.confidence.is_some());
        assert!(reread.record.ai_suggestion.is_some());
    }

    #[test]
    fn test_invalid_input_is_rejected() {
        let (svc, _, narrator) = service(None);
        let mut req = request("wheezing");
        req.clinical.age = 300;
        assert!(matches!(svc.diagnose(&req), Err(DxError::Validation(_))));
        assert_eq!(*narrator.calls.lock().expect("Lock failed"), 0);
    }
}
