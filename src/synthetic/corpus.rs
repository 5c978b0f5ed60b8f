//! Reading and writing corpora on disk.
//!
//! JSON holds the full records. The CSV flattening uses pipe-joined list
//! fields and `vs_`/`lab_` measurement columns, the same layout the tabular
//! import reads back.

use std::fs;
use std::io;
use std::path::Path;

use crate::domain::{PatientRecord, LAB_FEATURES, VITAL_FEATURES};

/// File name of the seed corpus inside the data directory.
pub const CORPUS_JSON: &str = "synthetic_patients.json";
pub const CORPUS_CSV: &str = "synthetic_patients.csv";

const SCALAR_COLUMNS: [&str; 27] = [
    "patient_id",
    "first_name",
    "last_name",
    "age",
    "gender",
    "blood_group",
    "country",
    "state",
    "city",
    "contact",
    "email",
    "weight_kg",
    "height_cm",
    "smoking",
    "alcohol",
    "existing_conditions",
    "family_history",
    "current_medications",
    "allergies",
    "symptoms",
    "symptom_duration_days",
    "diagnosis",
    "severity",
    "treatment",
    "root_cause",
    "created_at",
    "updated_at",
];

fn ensure_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

/// Write records as pretty-printed JSON.
///
/// # Errors
/// Returns error if the file cannot be written.
pub fn save_json(records: &[PatientRecord], path: &Path) -> crate::Result<()> {
    ensure_parent(path)?;
    let file = fs::File::create(path)?;
    serde_json::to_writer_pretty(io::BufWriter::new(file), records)?;
    tracing::info!("Saved {} records to {}", records.len(), path.display());
    Ok(())
}

/// Read records written by [`save_json`].
///
/// # Errors
/// Returns error if the file is missing or malformed.
pub fn load_json(path: &Path) -> crate::Result<Vec<PatientRecord>> {
    let file = fs::File::open(path)?;
    let records: Vec<PatientRecord> = serde_json::from_reader(io::BufReader::new(file))?;
    tracing::debug!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn flatten(record: &PatientRecord) -> Vec<String> {
    let c = &record.clinical;
    let mut row = vec![
        opt(record.patient_id.as_deref()),
        record.first_name.clone(),
        record.last_name.clone(),
        c.age.to_string(),
        c.gender.to_string(),
        opt(record.blood_group.map(|b| b.as_str())),
        record.country.clone(),
        opt(record.state.as_deref()),
        opt(record.city.as_deref()),
        opt(record.contact.as_deref()),
        opt(record.email.as_deref()),
        opt(record.weight_kg),
        opt(record.height_cm),
        c.smoking.to_string(),
        c.alcohol.to_string(),
        c.existing_conditions.join("|"),
        c.family_history.join("|"),
        record.current_medications.join("|"),
        record.allergies.join("|"),
        c.symptoms.join("|"),
        opt(c.symptom_duration_days),
        opt(record.diagnosis.as_deref()),
        opt(record.severity.map(|s| s.as_str())),
        opt(record.treatment.as_deref()),
        opt(record.root_cause.as_deref()),
        opt(record.created_at.map(|t| t.to_rfc3339())),
        opt(record.updated_at.map(|t| t.to_rfc3339())),
    ];
    row.extend(
        VITAL_FEATURES
            .iter()
            .map(|name| opt(c.vital_signs.as_ref().and_then(|v| v.get(name)))),
    );
    row.extend(
        LAB_FEATURES
            .iter()
            .map(|name| opt(c.lab_results.as_ref().and_then(|l| l.get(name)))),
    );
    row
}

/// Write records as a flat CSV.
///
/// # Errors
/// Returns error if the file cannot be written.
pub fn save_csv(records: &[PatientRecord], path: &Path) -> crate::Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path).map_err(io::Error::from)?;

    let header: Vec<String> = SCALAR_COLUMNS
        .iter()
        .map(|c| (*c).to_string())
        .chain(VITAL_FEATURES.iter().map(|n| format!("vs_{n}")))
        .chain(LAB_FEATURES.iter().map(|n| format!("lab_{n}")))
        .collect();
    writer.write_record(&header).map_err(io::Error::from)?;

    for record in records {
        writer.write_record(flatten(record)).map_err(io::Error::from)?;
    }
    writer.flush()?;
    tracing::info!("Saved CSV with {} rows to {}", records.len(), path.display());
    Ok(())
}
