//! Seeding, reseeding and export of the patient corpus.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::domain::{PatientRecord, StoredPatient};
use crate::ports::Storage;
use crate::synthetic::{self, corpus};
use crate::DxError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedOutcome {
    pub message: String,
    pub count: usize,
}

pub struct DataService<S>
where
    S: Storage,
{
    storage: Arc<S>,
    data_dir: PathBuf,
    seed_count: usize,
}

impl<S> DataService<S>
where
    S: Storage,
    S::Error: Into<crate::adapters::StorageError>,
{
    pub fn new(storage: Arc<S>, data_dir: impl Into<PathBuf>, seed_count: usize) -> Self {
        Self {
            storage,
            data_dir: data_dir.into(),
            seed_count,
        }
    }

    fn corpus_path(&self) -> PathBuf {
        self.data_dir.join(corpus::CORPUS_JSON)
    }

    /// Fill an empty database from the saved corpus, generating one if none
    /// exists. A database that already has records is left alone.
    ///
    /// # Errors
    /// Returns error if the corpus cannot be read or stored.
    pub fn seed(&self) -> crate::Result<SeedOutcome> {
        let existing = self
            .storage
            .count_patients()
            .map_err(|e| DxError::Storage(e.into()))?;
        if existing > 0 {
            return Ok(SeedOutcome {
                message: format!(
                    "Database already has {existing} records. Use /api/data/reseed to force."
                ),
                count: existing,
            });
        }

        let path = self.corpus_path();
        let records = if path.exists() {
            corpus::load_json(&path)?
        } else {
            self.fresh_corpus()?
        };

        let count = self.insert(&records)?;
        Ok(SeedOutcome {
            message: format!("Seeded {count} patient records"),
            count,
        })
    }

    /// Replace every stored patient with a freshly generated corpus.
    ///
    /// The corpus is generated and saved before storage is touched, and the
    /// swap is a single transaction, so a failure keeps the old patients.
    ///
    /// # Errors
    /// Returns error if storage or the corpus file fails.
    pub fn reseed(&self) -> crate::Result<SeedOutcome> {
        let records = self.fresh_corpus()?;
        let count = self
            .storage
            .replace_patients(&records)
            .map_err(|e| DxError::Storage(e.into()))?;
        Ok(SeedOutcome {
            message: format!("Reseeded {count} patient records"),
            count,
        })
    }

    /// # Errors
    /// Returns error if storage operation fails.
    pub fn export(&self) -> crate::Result<Vec<StoredPatient>> {
        self.storage
            .all_patients()
            .map_err(|e| DxError::Storage(e.into()))
    }

    fn fresh_corpus(&self) -> crate::Result<Vec<PatientRecord>> {
        let records = synthetic::generate(self.seed_count);
        corpus::save_json(&records, &self.corpus_path())?;
        Ok(records)
    }

    fn insert(&self, records: &[PatientRecord]) -> crate::Result<usize> {
        self.storage
            .insert_patients(records)
            .map_err(|e| DxError::Storage(e.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::SqliteStorage;

    fn service(dir: &std::path::Path, n: usize) -> (DataService<SqliteStorage>, Arc<SqliteStorage>) {
        let storage = Arc::new(SqliteStorage::in_memory().expect("Should create db"));
        (DataService::new(Arc::clone(&storage), dir, n), storage)
    }

    #[test]
    fn test_seed_generates_and_saves_corpus() {
        let dir = tempfile::tempdir().expect("Should create tempdir");
        let (svc, storage) = service(dir.path(), 30);

        let outcome = svc.seed().expect("Should seed");
        assert_eq!(outcome.count, 30);
        assert_eq!(outcome.message, "Seeded 30 patient records");
        assert_eq!(storage.count_patients().expect("Should count"), 30);
        assert!(dir.path().join(corpus::CORPUS_JSON).exists());
    }

    #[test]
    fn test_seed_is_noop_when_populated() {
        let dir = tempfile::tempdir().expect("Should create tempdir");
        let (svc, storage) = service(dir.path(), 10);
        svc.seed().expect("Should seed");

        let outcome = svc.seed().expect("Should seed");
        assert_eq!(outcome.count, 10);
        assert!(outcome.message.contains("already has 10 records"));
        assert_eq!(storage.count_patients().expect("Should count"), 10);
    }

    #[test]
    fn test_seed_prefers_saved_corpus() {
        let dir = tempfile::tempdir().expect("Should create tempdir");
        corpus::save_json(&synthetic::generate(7), &dir.path().join(corpus::CORPUS_JSON))
            .expect("Should save");
        let (svc, _) = service(dir.path(), 100);
        assert_eq!(svc.seed().expect("Should seed").count, 7);
    }

    #[test]
    fn test_reseed_replaces_and_export_returns_all() {
        let dir = tempfile::tempdir().expect("Should create tempdir");
        let (svc, storage) = service(dir.path(), 12);
        svc.seed().expect("Should seed");

        let outcome = svc.reseed().expect("Should reseed");
        assert_eq!(outcome.message, "Reseeded 12 patient records");
        assert_eq!(storage.count_patients().expect("Should count"), 12);
        assert_eq!(svc.export().expect("Should export").len(), 12);
    }

    #[test]
    fn test_failed_reseed_keeps_existing_patients() {
        let dir = tempfile::tempdir().expect("Should create tempdir");
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").expect("Should write file");

        let (svc, storage) = service(&blocker.join("data"), 12);
        storage
            .insert_patients(&synthetic::generate(20))
            .expect("Should insert");

        let err = svc.reseed().expect_err("Should fail to save corpus");
        assert!(matches!(err, DxError::Io(_)));
        assert_eq!(storage.count_patients().expect("Should count"), 20);
    }
}
