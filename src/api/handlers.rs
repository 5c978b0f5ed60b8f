//! Route handlers.
//!
//! Services are synchronous (SQLite behind a mutex, blocking LLM client),
//! so every call is moved onto the blocking pool.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::error::ApiError;
use super::state::AppState;
use crate::application::{ImportReport, SeedOutcome};
use crate::domain::{
    DiagnosisRequest, DiagnosisResult, ImageAnalysis, ImageType, PatientRecord, StoredPatient,
};
use crate::ml::SYMPTOM_VOCABULARY;
use crate::ports::{Paging, PatientFilter};

async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> crate::Result<T> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(f).await??)
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PatientQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub search: Option<String>,
    pub diagnosis: Option<String>,
    pub country: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// An uploaded file from a multipart body.
struct Upload {
    filename: String,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

/// Collect the `file` part and any plain text fields.
async fn read_upload(mut multipart: Multipart) -> Result<(Upload, Vec<(String, String)>), ApiError> {
    let mut upload = None;
    let mut fields = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let filename = field.file_name().unwrap_or("upload").to_string();
            let content_type = field.content_type().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {e}")))?;
            upload = Some(Upload {
                filename,
                content_type,
                bytes: bytes.to_vec(),
            });
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read field {name}: {e}")))?;
            fields.push((name, text));
        }
    }

    let upload = upload.ok_or_else(|| ApiError::BadRequest("Missing file field".into()))?;
    Ok((upload, fields))
}

pub async fn root() -> Json<Value> {
    Json(json!({
        "name": "dxassist diagnosis support service",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "operational",
        "endpoints": {
            "patients": "/api/patients",
            "diagnosis": "/api/diagnosis/predict",
            "image_analysis": "/api/diagnosis/analyze-image",
            "csv_upload": "/api/diagnosis/upload-csv",
            "seed_data": "/api/data/seed",
            "train_model": "/api/data/train",
        },
    }))
}

pub async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let storage = state.storage.clone();
    let database = tokio::task::spawn_blocking(move || storage.ping().is_ok()).await?;
    Ok(Json(json!({
        "status": "healthy",
        "database": if database { "connected" } else { "disconnected" },
        "ml_model": if state.predictions.is_loaded() { "loaded" } else { "not loaded" },
    })))
}

// Patients

pub async fn create_patient(
    State(state): State<AppState>,
    Json(record): Json<PatientRecord>,
) -> Result<impl IntoResponse, ApiError> {
    let patients = state.patients.clone();
    let stored = blocking(move || patients.create(&record)).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

pub async fn list_patients(
    State(state): State<AppState>,
    Query(query): Query<PatientQuery>,
) -> Result<Json<Value>, ApiError> {
    let paging = Paging::new(query.page, query.limit);
    let filter = PatientFilter {
        search: non_blank(query.search),
        diagnosis: non_blank(query.diagnosis),
        country: non_blank(query.country),
    };

    let patients = state.patients.clone();
    let page = blocking(move || patients.list(&filter, paging)).await?;
    Ok(Json(json!({
        "patients": page.items,
        "total": page.total,
        "page": page.page,
        "limit": page.limit,
        "pages": page.pages,
    })))
}

pub async fn patient_stats(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let patients = state.patients.clone();
    let stats = blocking(move || patients.stats()).await?;
    Ok(Json(stats.to_json()))
}

pub async fn get_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StoredPatient>, ApiError> {
    let patients = state.patients.clone();
    Ok(Json(blocking(move || patients.get(&id)).await?))
}

pub async fn delete_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let patients = state.patients.clone();
    blocking(move || patients.delete(&id)).await?;
    Ok(Json(json!({ "message": "Patient deleted" })))
}

// Diagnosis

pub async fn predict(
    State(state): State<AppState>,
    Json(request): Json<DiagnosisRequest>,
) -> Result<Json<DiagnosisResult>, ApiError> {
    let diagnosis = state.diagnosis.clone();
    Ok(Json(blocking(move || diagnosis.diagnose(&request)).await?))
}

pub async fn upload_csv(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ImportReport>, ApiError> {
    let (upload, _) = read_upload(multipart).await?;
    tracing::info!("Importing {} ({} bytes)", upload.filename, upload.bytes.len());

    let import = state.import.clone();
    let report = blocking(move || import.import(&upload.filename, &upload.bytes)).await?;
    Ok(Json(report))
}

pub async fn analyze_image(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ImageAnalysis>, ApiError> {
    let (upload, fields) = read_upload(multipart).await?;
    let image_type = fields
        .iter()
        .find(|(name, _)| name == "image_type")
        .map_or(ImageType::Xray, |(_, value)| ImageType::from(value.as_str()));

    let imaging = state.imaging.clone();
    let analysis = blocking(move || {
        imaging.analyze(
            &upload.filename,
            upload.content_type.as_deref(),
            image_type,
            &upload.bytes,
        )
    })
    .await?;
    Ok(Json(analysis))
}

pub async fn symptoms(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let predictions = state.predictions.clone();
    let model = tokio::task::spawn_blocking(move || predictions.available()).await?;
    let symptoms: Vec<String> = match model {
        Some(model) => model.symptoms().to_vec(),
        None => SYMPTOM_VOCABULARY.iter().map(|s| (*s).to_string()).collect(),
    };
    Ok(Json(json!({ "symptoms": symptoms })))
}

pub async fn diseases(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let predictions = state.predictions.clone();
    let model = tokio::task::spawn_blocking(move || predictions.available()).await?;
    let diseases: Vec<String> = match model {
        Some(model) => model.classes().to_vec(),
        None => crate::synthetic::disease_names()
            .into_iter()
            .map(str::to_string)
            .collect(),
    };
    Ok(Json(json!({ "diseases": diseases })))
}

pub async fn history(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>, ApiError> {
    let paging = Paging::new(query.page, query.limit);
    let diagnosis = state.diagnosis.clone();
    let page = blocking(move || diagnosis.history(paging.page, paging.limit)).await?;
    Ok(Json(json!({
        "history": page.items,
        "total": page.total,
        "page": page.page,
        "limit": page.limit,
    })))
}

// Data management

pub async fn seed(State(state): State<AppState>) -> Result<Json<SeedOutcome>, ApiError> {
    let data = state.data.clone();
    Ok(Json(blocking(move || data.seed()).await?))
}

pub async fn reseed(State(state): State<AppState>) -> Result<Json<SeedOutcome>, ApiError> {
    let data = state.data.clone();
    Ok(Json(blocking(move || data.reseed()).await?))
}

pub async fn train(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let training = state.training.clone();
    let report = blocking(move || training.retrain()).await?;
    Ok(Json(json!({
        "message": "Model trained successfully",
        "accuracy": report.accuracy,
        "n_classes": report.n_classes,
        "classes": report.classes,
        "n_samples": report.n_samples,
    })))
}

pub async fn export(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let data = state.data.clone();
    let records = blocking(move || data.export()).await?;
    Ok(Json(json!({
        "count": records.len(),
        "data": records,
    })))
}
