//! Shared handler state.

use std::sync::Arc;

use crate::adapters::sqlite::SqliteStorage;
use crate::application::{
    DataService, DiagnosisService, ImagingService, ImportService, PatientService,
    PredictionService, TrainingService,
};
use crate::config::Config;
use crate::ml::BoostingParams;
use crate::ports::{ImageInterpreter, NarrativeGenerator};

/// Services behind the HTTP surface. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<SqliteStorage>,
    pub predictions: Arc<PredictionService>,
    pub patients: Arc<PatientService<SqliteStorage>>,
    pub diagnosis: Arc<DiagnosisService<SqliteStorage>>,
    pub imaging: Arc<ImagingService<SqliteStorage>>,
    pub import: Arc<ImportService>,
    pub training: Arc<TrainingService<SqliteStorage>>,
    pub data: Arc<DataService<SqliteStorage>>,
    pub cors_origins: Arc<[String]>,
}

impl AppState {
    pub fn new(
        config: &Config,
        storage: Arc<SqliteStorage>,
        predictions: Arc<PredictionService>,
        narrator: Arc<dyn NarrativeGenerator>,
        interpreter: Arc<dyn ImageInterpreter>,
        params: BoostingParams,
    ) -> Self {
        Self {
            patients: Arc::new(PatientService::new(Arc::clone(&storage))),
            diagnosis: Arc::new(DiagnosisService::new(
                Arc::clone(&storage),
                Arc::clone(&predictions),
                narrator,
            )),
            imaging: Arc::new(ImagingService::new(Arc::clone(&storage), interpreter)),
            import: Arc::new(ImportService::new(Arc::clone(&predictions))),
            training: Arc::new(TrainingService::new(
                Arc::clone(&storage),
                Arc::clone(&predictions),
                params,
            )),
            data: Arc::new(DataService::new(
                Arc::clone(&storage),
                config.data_dir.clone(),
                config.seed_count,
            )),
            cors_origins: config.cors_origins.clone().into(),
            storage,
            predictions,
        }
    }
}
