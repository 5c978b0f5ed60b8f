//! SQLite adapter: Implementation of Storage.
//!
//! Patients are stored as a JSON document next to the columns that listing,
//! filtering and grouping need. History tables are append-only documents.
//!
//! # Mutex Behavior
//!
//! Database connection is protected by `Mutex`. A poisoned mutex (from panic
//! in another thread) will cause panic. This fail-fast behavior is intentional
//! for data integrity in healthcare applications.
use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::{DiagnosisEntry, ImageAnalysisEntry, PatientRecord, StoredPatient};
use crate::ports::{CountBucket, GroupField, Page, PatientFilter, Storage};

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// SQLite storage adapter.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Open (or create) the database at `path`, creating parent directories.
    ///
    /// # Errors
    /// Returns error if database cannot be opened or initialized.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    /// Create an in-memory SQLite database (for testing).
    ///
    /// # Errors
    /// Returns error if database cannot be created.
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    /// Cheap liveness probe for health reporting.
    ///
    /// # Errors
    /// Returns error if the database does not answer.
    pub fn ping(&self) -> Result<(), StorageError> {
        let conn = self.conn.lock().expect("Lock failed");
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    /// Initialize the database schema.
    fn init_schema(&self) -> Result<(), StorageError> {
        let conn = self.conn.lock().expect("Lock failed");

        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS patients (
                id TEXT PRIMARY KEY,
                patient_id TEXT,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                age INTEGER NOT NULL,
                gender TEXT NOT NULL,
                country TEXT,
                diagnosis TEXT,
                severity TEXT,
                document TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_patients_created
                ON patients(created_at DESC);
            CREATE INDEX IF NOT EXISTS idx_patients_patient_id
                ON patients(patient_id);

            CREATE TABLE IF NOT EXISTS diagnosis_history (
                id TEXT PRIMARY KEY,
                patient_id TEXT,
                predicted_disease TEXT NOT NULL,
                confidence REAL NOT NULL,
                document TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_history_created
                ON diagnosis_history(created_at DESC);

            CREATE TABLE IF NOT EXISTS image_analyses (
                id TEXT PRIMARY KEY,
                filename TEXT NOT NULL,
                image_type TEXT NOT NULL,
                document TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            ",
        )?;

        Ok(())
    }

    fn insert_with(conn: &Connection, record: &PatientRecord) -> Result<StoredPatient, StorageError> {
        let now = Utc::now();
        let mut record = record.clone();
        let created_at = *record.created_at.get_or_insert(now);
        if record.updated_at.is_none() {
            record.updated_at = Some(now);
        }

        let stored = StoredPatient {
            id: uuid::Uuid::new_v4().to_string(),
            record,
        };
        let r = &stored.record;
        conn.execute(
            r"
            INSERT INTO patients (
                id, patient_id, first_name, last_name, age, gender,
                country, diagnosis, severity, document, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ",
            params![
                stored.id,
                r.patient_id,
                r.first_name,
                r.last_name,
                i64::from(r.clinical.age),
                r.clinical.gender.as_str(),
                non_blank(&r.country),
                r.label(),
                r.severity.map(|s| s.as_str()),
                to_document(r)?,
                timestamp(created_at),
            ],
        )?;
        Ok(stored)
    }

    fn patients_where(
        conn: &Connection,
        clause: &str,
        values: Vec<Value>,
        order: &str,
    ) -> Result<Vec<StoredPatient>, StorageError> {
        let sql = format!("SELECT id, document FROM patients {clause} ORDER BY {order}");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, doc)| {
                Ok(StoredPatient {
                    id,
                    record: from_document(&doc)?,
                })
            })
            .collect()
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn non_blank(s: &str) -> Option<&str> {
    let t = s.trim();
    (!t.is_empty()).then_some(t)
}

fn to_document<T: Serialize>(value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(|e| StorageError::Serialization(e.to_string()))
}

fn from_document<T: DeserializeOwned>(doc: &str) -> Result<T, StorageError> {
    serde_json::from_str(doc).map_err(|e| StorageError::Serialization(e.to_string()))
}

/// `%term%` with LIKE metacharacters escaped by `\`.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn filter_clause(filter: &PatientFilter) -> (String, Vec<Value>) {
    let mut conditions = Vec::new();
    let mut values = Vec::new();

    if let Some(term) = filter.search.as_deref().and_then(non_blank) {
        conditions.push(
            r"(first_name LIKE ? ESCAPE '\' OR last_name LIKE ? ESCAPE '\' OR patient_id LIKE ? ESCAPE '\')",
        );
        let pattern = like_pattern(term);
        for _ in 0..3 {
            values.push(Value::Text(pattern.clone()));
        }
    }
    if let Some(term) = filter.diagnosis.as_deref().and_then(non_blank) {
        conditions.push(r"diagnosis LIKE ? ESCAPE '\'");
        values.push(Value::Text(like_pattern(term)));
    }
    if let Some(term) = filter.country.as_deref().and_then(non_blank) {
        conditions.push(r"country LIKE ? ESCAPE '\'");
        values.push(Value::Text(like_pattern(term)));
    }

    if conditions.is_empty() {
        (String::new(), values)
    } else {
        (format!("WHERE {}", conditions.join(" AND ")), values)
    }
}

fn group_column(field: GroupField) -> &'static str {
    match field {
        GroupField::Diagnosis => "diagnosis",
        GroupField::Country => "country",
        GroupField::Severity => "severity",
        GroupField::Gender => "gender",
    }
}

impl Storage for SqliteStorage {
    type Error = StorageError;

    fn insert_patient(&self, record: &PatientRecord) -> Result<StoredPatient, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        let stored = Self::insert_with(&conn, record)?;
        tracing::debug!("Saved patient {} to storage", stored.id);
        Ok(stored)
    }

    fn insert_patients(&self, records: &[PatientRecord]) -> Result<usize, Self::Error> {
        let mut conn = self.conn.lock().expect("Lock failed");
        let tx = conn.transaction()?;
        for record in records {
            Self::insert_with(&tx, record)?;
        }
        tx.commit()?;
        tracing::info!("Saved {} patients to storage", records.len());
        Ok(records.len())
    }

    fn find_patient(&self, id: &str) -> Result<Option<StoredPatient>, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        let row: Option<(String, String)> = conn
            .query_row(
                r"
                SELECT id, document FROM patients
                WHERE id = ?1 OR patient_id = ?1
                ORDER BY (id = ?1) DESC, created_at DESC
                LIMIT 1
                ",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        row.map(|(id, doc)| {
            Ok(StoredPatient {
                id,
                record: from_document(&doc)?,
            })
        })
        .transpose()
    }

    fn list_patients(
        &self,
        filter: &PatientFilter,
        page: usize,
        limit: usize,
    ) -> Result<Page<StoredPatient>, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        let (clause, values) = filter_clause(filter);

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM patients {clause}"),
            params_from_iter(values.iter()),
            |row| row.get(0),
        )?;

        let order = format!(
            "created_at DESC, rowid DESC LIMIT {} OFFSET {}",
            limit,
            Page::<StoredPatient>::offset(page, limit)
        );
        let items = Self::patients_where(&conn, &clause, values, &order)?;

        Ok(Page::new(items, total as usize, page, limit))
    }

    fn update_patient(&self, patient: &StoredPatient) -> Result<bool, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        let r = &patient.record;
        let changed = conn.execute(
            r"
            UPDATE patients SET
                patient_id = ?2, first_name = ?3, last_name = ?4, age = ?5,
                gender = ?6, country = ?7, diagnosis = ?8, severity = ?9,
                document = ?10
            WHERE id = ?1
            ",
            params![
                patient.id,
                r.patient_id,
                r.first_name,
                r.last_name,
                i64::from(r.clinical.age),
                r.clinical.gender.as_str(),
                non_blank(&r.country),
                r.label(),
                r.severity.map(|s| s.as_str()),
                to_document(r)?,
            ],
        )?;
        Ok(changed > 0)
    }

    fn delete_patient(&self, id: &str) -> Result<bool, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        let mut changed = conn.execute("DELETE FROM patients WHERE id = ?1", params![id])?;
        if changed == 0 {
            changed = conn.execute("DELETE FROM patients WHERE patient_id = ?1", params![id])?;
        }
        Ok(changed > 0)
    }

    fn count_patients(&self) -> Result<usize, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM patients", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn count_labeled(&self) -> Result<usize, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM patients WHERE diagnosis IS NOT NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn labeled_patients(&self) -> Result<Vec<PatientRecord>, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        let rows = Self::patients_where(
            &conn,
            "WHERE diagnosis IS NOT NULL",
            Vec::new(),
            "created_at ASC, rowid ASC",
        )?;
        Ok(rows.into_iter().map(|p| p.record).collect())
    }

    fn all_patients(&self) -> Result<Vec<StoredPatient>, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        Self::patients_where(&conn, "", Vec::new(), "created_at ASC, rowid ASC")
    }

    fn clear_patients(&self) -> Result<usize, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        let removed = conn.execute("DELETE FROM patients", [])?;
        tracing::warn!("Cleared {} patients from storage", removed);
        Ok(removed)
    }

    fn replace_patients(&self, records: &[PatientRecord]) -> Result<usize, Self::Error> {
        let mut conn = self.conn.lock().expect("Lock failed");
        let mut tx = conn.transaction()?;
        let removed = tx.execute("DELETE FROM patients", [])?;

        let mut stored = 0usize;
        for record in records {
            let savepoint = tx.savepoint()?;
            let result = Self::insert_with(&savepoint, record);
            match result {
                Ok(_) => {
                    savepoint.commit()?;
                    stored += 1;
                }
                Err(e) => tracing::warn!(
                    "Skipping patient {}: {}",
                    record.patient_id.as_deref().unwrap_or("<no id>"),
                    e
                ),
            }
        }

        tx.commit()?;
        tracing::info!(
            "Replaced {} patients with {} ({} skipped)",
            removed,
            stored,
            records.len() - stored
        );
        Ok(stored)
    }

    fn count_by(&self, field: GroupField) -> Result<Vec<CountBucket>, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        let column = group_column(field);
        let mut stmt = conn.prepare(&format!(
            "SELECT {column}, COUNT(*) AS n FROM patients
             WHERE {column} IS NOT NULL
             GROUP BY {column}
             ORDER BY n DESC, {column} ASC"
        ))?;
        let buckets = stmt
            .query_map([], |row| {
                let count: i64 = row.get(1)?;
                Ok(CountBucket {
                    label: row.get(0)?,
                    count: count as usize,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(buckets)
    }

    fn patient_ages(&self) -> Result<Vec<u32>, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        let mut stmt = conn.prepare("SELECT age FROM patients")?;
        let ages = stmt
            .query_map([], |row| row.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ages
            .into_iter()
            .map(|a| u32::try_from(a).unwrap_or(0))
            .collect())
    }

    fn append_diagnosis(&self, entry: &DiagnosisEntry) -> Result<(), Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        conn.execute(
            r"
            INSERT INTO diagnosis_history (
                id, patient_id, predicted_disease, confidence, document, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
            params![
                entry.id,
                entry.patient_id,
                entry.result.prediction.predicted_disease,
                entry.result.prediction.confidence,
                to_document(entry)?,
                timestamp(entry.created_at),
            ],
        )?;
        tracing::debug!("Saved diagnosis {} to storage", entry.id);
        Ok(())
    }

    fn diagnosis_history(
        &self,
        page: usize,
        limit: usize,
    ) -> Result<Page<DiagnosisEntry>, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");

        let total: i64 =
            conn.query_row("SELECT COUNT(*) FROM diagnosis_history", [], |row| row.get(0))?;

        let mut stmt = conn.prepare(
            r"
            SELECT document FROM diagnosis_history
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?1 OFFSET ?2
            ",
        )?;
        let docs = stmt
            .query_map(
                params![limit as i64, Page::<DiagnosisEntry>::offset(page, limit) as i64],
                |row| row.get::<_, String>(0),
            )?
            .collect::<Result<Vec<_>, _>>()?;
        let items = docs
            .iter()
            .map(|doc| from_document(doc))
            .collect::<Result<Vec<DiagnosisEntry>, _>>()?;

        Ok(Page::new(items, total as usize, page, limit))
    }

    fn append_image_analysis(&self, entry: &ImageAnalysisEntry) -> Result<(), Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        conn.execute(
            r"
            INSERT INTO image_analyses (id, filename, image_type, document, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
            params![
                entry.id,
                entry.filename,
                entry.image_type.as_str(),
                to_document(entry)?,
                timestamp(entry.created_at),
            ],
        )?;
        tracing::debug!("Saved image analysis {} to storage", entry.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        ClinicalProfile, DiagnosisRequest, DiagnosisResult, Gender, ImageAnalysis, ImageType,
        Narrative, NarrativeSource, Prediction, Severity,
    };

    fn patient(first: &str, last: &str, diagnosis: Option<&str>, country: &str) -> PatientRecord {
        let mut r = PatientRecord::new(
            first,
            last,
            ClinicalProfile {
                age: 40,
                gender: Gender::Female,
                symptoms: vec!["fatigue".into()],
                ..Default::default()
            },
        );
        r.diagnosis = diagnosis.map(str::to_string);
        r.country = country.to_string();
        r
    }

    fn entry(disease: &str) -> DiagnosisEntry {
        let prediction = Prediction {
            predicted_disease: disease.to_string(),
            confidence: 91.2,
            top_predictions: Vec::new(),
        };
        let result = DiagnosisResult {
            narrative: Narrative::fallback(&prediction),
            prediction,
            narrative_source: NarrativeSource::Fallback,
        };
        DiagnosisEntry::new(&DiagnosisRequest::default(), result)
    }

    #[test]
    fn test_replace_skips_rejected_records() {
        let storage = SqliteStorage::in_memory().expect("Should create db");
        storage
            .insert_patients(&[patient("Old", "One", Some("Asthma"), "India")])
            .expect("Should save");
        storage
            .conn
            .lock()
            .expect("Lock failed")
            .execute_batch(
                "CREATE TRIGGER reject_broken BEFORE INSERT ON patients
                 WHEN NEW.first_name = 'Broken'
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .expect("Should create trigger");

        let records = vec![
            patient("Asha", "Rao", Some("Asthma"), "India"),
            patient("Broken", "Row", Some("Asthma"), "India"),
            patient("Chen", "Li", Some("Migraine"), "China"),
        ];
        let stored = storage.replace_patients(&records).expect("Should replace");
        assert_eq!(stored, 2);

        let names: Vec<String> = storage
            .all_patients()
            .expect("Should load")
            .into_iter()
            .map(|p| p.record.first_name)
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"Asha".to_string()));
        assert!(names.contains(&"Chen".to_string()));
    }

    #[test]
    fn test_failed_replace_keeps_previous_patients() {
        let storage = SqliteStorage::in_memory().expect("Should create db");
        storage
            .insert_patients(&[
                patient("Old", "One", Some("Asthma"), "India"),
                patient("Old", "Two", Some("Anemia"), "India"),
            ])
            .expect("Should save");
        storage
            .conn
            .lock()
            .expect("Lock failed")
            .execute_batch(
                "CREATE TRIGGER keep_patients BEFORE DELETE ON patients
                 BEGIN SELECT RAISE(ABORT, 'locked'); END;",
            )
            .expect("Should create trigger");

        let records = vec![patient("New", "One", Some("Asthma"), "India")];
        assert!(storage.replace_patients(&records).is_err());
        assert_eq!(storage.count_patients().expect("Should count"), 2);
    }

    #[test]
    fn test_patient_crud() {
        let storage = SqliteStorage::in_memory().expect("Should create db");
        assert_eq!(storage.count_patients().expect("Should count"), 0);

        let mut record = patient("Asha", "Rao", Some("Asthma"), "India");
        record.patient_id = Some("EP00001".into());
        let stored = storage.insert_patient(&record).expect("Should save");
        assert!(stored.record.created_at.is_some());

        let by_id = storage
            .find_patient(&stored.id)
            .expect("Should query")
            .expect("Should exist");
        assert_eq!(by_id.record.first_name, "Asha");
        let by_external = storage
            .find_patient("EP00001")
            .expect("Should query")
            .expect("Should exist");
        assert_eq!(by_external.id, stored.id);
        assert!(storage.find_patient("nope").expect("Should query").is_none());

        let mut updated = by_id.clone();
        updated.record.diagnosis = Some("COPD".into());
        updated.record.severity = Some(Severity::Severe);
        assert!(storage.update_patient(&updated).expect("Should update"));
        let reread = storage
            .find_patient(&stored.id)
            .expect("Should query")
            .expect("Should exist");
        assert_eq!(reread.record.diagnosis.as_deref(), Some("COPD"));
        assert_eq!(reread.record.clinical.symptoms, vec!["fatigue"]);

        assert!(storage.delete_patient("EP00001").expect("Should delete"));
        assert!(!storage.delete_patient(&stored.id).expect("Should delete"));
        assert_eq!(storage.count_patients().expect("Should count"), 0);
    }

    #[test]
    fn test_list_filters_and_pagination() {
        let storage = SqliteStorage::in_memory().expect("Should create db");
        let records = vec![
            patient("Asha", "Rao", Some("Asthma"), "India"),
            patient("Ben", "Cole", Some("Migraine"), "USA"),
            patient("Chen", "Li", None, "China"),
            patient("Dev", "Asher", Some("Bronchial Asthma"), "India"),
        ];
        assert_eq!(storage.insert_patients(&records).expect("Should save"), 4);

        let all = storage
            .list_patients(&PatientFilter::default(), 1, 20)
            .expect("Should list");
        assert_eq!(all.total, 4);
        assert_eq!(all.pages, 1);
        let names: Vec<_> = all.items.iter().map(|p| p.record.first_name.as_str()).collect();
        assert_eq!(names, vec!["Dev", "Chen", "Ben", "Asha"]);

        let search = PatientFilter {
            search: Some("ash".into()),
            ..Default::default()
        };
        assert_eq!(storage.list_patients(&search, 1, 20).expect("Should list").total, 2);

        let asthma = PatientFilter {
            diagnosis: Some("ASTHMA".into()),
            country: Some("ind".into()),
            ..Default::default()
        };
        assert_eq!(storage.list_patients(&asthma, 1, 20).expect("Should list").total, 2);

        let wildcard = PatientFilter {
            search: Some("%".into()),
            ..Default::default()
        };
        assert_eq!(storage.list_patients(&wildcard, 1, 20).expect("Should list").total, 0);

        let second = storage
            .list_patients(&PatientFilter::default(), 2, 3)
            .expect("Should list");
        assert_eq!(second.pages, 2);
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items[0].record.first_name, "Asha");
    }

    #[test]
    fn test_grouped_counts_and_labels() {
        let storage = SqliteStorage::in_memory().expect("Should create db");
        let records = vec![
            patient("A", "A", Some("Asthma"), "India"),
            patient("B", "B", Some("Asthma"), "India"),
            patient("C", "C", Some("Malaria"), "Kenya"),
            patient("D", "D", Some("  "), "India"),
        ];
        storage.insert_patients(&records).expect("Should save");

        let by_diagnosis = storage.count_by(GroupField::Diagnosis).expect("Should count");
        assert_eq!(
            by_diagnosis,
            vec![
                CountBucket { label: "Asthma".into(), count: 2 },
                CountBucket { label: "Malaria".into(), count: 1 },
            ]
        );
        assert!(storage.count_by(GroupField::Severity).expect("Should count").is_empty());
        assert_eq!(storage.count_by(GroupField::Country).expect("Should count")[0].count, 3);

        assert_eq!(storage.count_labeled().expect("Should count"), 3);
        assert_eq!(storage.labeled_patients().expect("Should load").len(), 3);
        assert_eq!(storage.patient_ages().expect("Should load"), vec![40; 4]);

        assert_eq!(storage.clear_patients().expect("Should clear"), 4);
        assert!(storage.all_patients().expect("Should load").is_empty());
    }

    #[test]
    fn test_history_is_newest_first() {
        let storage = SqliteStorage::in_memory().expect("Should create db");
        for disease in ["Asthma", "COPD", "Malaria"] {
            storage.append_diagnosis(&entry(disease)).expect("Should save");
        }

        let page = storage.diagnosis_history(1, 2).expect("Should load");
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].result.prediction.predicted_disease, "Malaria");
        assert_eq!(page.items[1].result.prediction.predicted_disease, "COPD");

        let last = storage.diagnosis_history(2, 2).expect("Should load");
        assert_eq!(last.items[0].result.prediction.predicted_disease, "Asthma");
    }

    #[test]
    fn test_image_analysis_append() {
        let storage = SqliteStorage::in_memory().expect("Should create db");
        let entry = ImageAnalysisEntry::new(
            "chest.png",
            ImageType::Xray,
            ImageAnalysis::specialist_review(ImageType::Xray),
        );
        storage.append_image_analysis(&entry).expect("Should save");
        storage.ping().expect("Should answer");
    }

    #[test]
    fn test_like_pattern_escapes() {
        assert_eq!(like_pattern("a%b_c\\"), r"%a\%b\_c\\%");
    }
}
