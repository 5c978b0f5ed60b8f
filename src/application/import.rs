//! Batch prediction over an uploaded CSV/XLSX file.

use std::sync::Arc;

use serde::Serialize;

use super::prediction::PredictionService;
use crate::adapters::tabular::{self, TabularFormat, TabularRow};
use crate::domain::Prediction;
use crate::DxError;

#[derive(Debug, Clone, Serialize)]
pub struct RowPrediction {
    pub row: usize,
    pub patient_name: String,
    #[serde(flatten)]
    pub prediction: Prediction,
}

#[derive(Debug, Clone, Serialize)]
pub struct RowError {
    pub row: usize,
    pub error: String,
}

/// Result for one data row.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum RowOutcome {
    Predicted(RowPrediction),
    Failed(RowError),
}

impl RowOutcome {
    #[must_use]
    pub fn row(&self) -> usize {
        match self {
            Self::Predicted(p) => p.row,
            Self::Failed(e) => e.row,
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub total_rows: usize,
    pub predictions: Vec<RowOutcome>,
}

pub struct ImportService {
    predictions: Arc<PredictionService>,
}

impl ImportService {
    #[must_use]
    pub fn new(predictions: Arc<PredictionService>) -> Self {
        Self { predictions }
    }

    /// Predict every row of an upload. Row failures are reported inline.
    ///
    /// # Errors
    /// `Import` if the file is unreadable, `ModelNotTrained` if no model
    /// exists.
    pub fn import(&self, filename: &str, bytes: &[u8]) -> crate::Result<ImportReport> {
        let format = TabularFormat::from_filename(filename)?;
        let rows = tabular::read_rows(bytes, format)?;
        let model = self.predictions.model()?;

        let predictions: Vec<RowOutcome> = rows
            .iter()
            .map(|row| match predict_row(&model, row) {
                Ok(prediction) => RowOutcome::Predicted(RowPrediction {
                    row: row.row,
                    patient_name: row.patient_name(),
                    prediction,
                }),
                Err(e) => RowOutcome::Failed(RowError {
                    row: row.row,
                    error: e.to_string(),
                }),
            })
            .collect();

        let failed = predictions.iter().filter(|p| p.is_error()).count();
        tracing::info!(
            "Imported {} rows ({} failed)",
            predictions.len(),
            failed
        );

        Ok(ImportReport {
            total_rows: rows.len(),
            predictions,
        })
    }
}

fn predict_row(model: &super::prediction::LoadedModel, row: &TabularRow) -> crate::Result<Prediction> {
    let request = row.to_request()?;
    request
        .clinical
        .validate()
        .map_err(|errors| DxError::Validation(errors.join("; ")))?;
    model.predict(&request.clinical)
}
