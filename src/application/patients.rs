//! Patient intake, lookup and aggregate statistics.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};

use crate::domain::{PatientRecord, StoredPatient};
use crate::ports::{CountBucket, GroupField, Page, Paging, PatientFilter, Storage};
use crate::DxError;

/// Age histogram boundaries. A bucket is labeled by its lower bound.
pub const AGE_BOUNDARIES: [u32; 7] = [0, 18, 30, 45, 60, 75, 120];

/// Grouped counts over the stored patients.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientStats {
    pub total_patients: usize,
    pub diagnosis: Vec<CountBucket>,
    pub country: Vec<CountBucket>,
    pub severity: Vec<CountBucket>,
    pub gender: Vec<CountBucket>,
    pub age: Vec<CountBucket>,
}

impl PatientStats {
    /// Wire shape: each distribution keyed by what it counts.
    #[must_use]
    pub fn to_json(&self) -> Value {
        fn keyed(key: &str, buckets: &[CountBucket]) -> Vec<Value> {
            buckets
                .iter()
                .map(|b| {
                    let mut entry = serde_json::Map::new();
                    entry.insert(key.to_string(), Value::from(b.label.clone()));
                    entry.insert("count".to_string(), Value::from(b.count));
                    Value::Object(entry)
                })
                .collect()
        }

        json!({
            "total_patients": self.total_patients,
            "diagnosis_distribution": keyed("disease", &self.diagnosis),
            "country_distribution": keyed("country", &self.country),
            "severity_distribution": keyed("severity", &self.severity),
            "gender_distribution": keyed("gender", &self.gender),
            "age_distribution": keyed("range", &self.age),
        })
    }
}

impl Serialize for PatientStats {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Bucket ages by [`AGE_BOUNDARIES`]. Empty buckets are omitted; ages past
/// the last boundary count as "Unknown".
#[must_use]
pub fn age_histogram(ages: &[u32]) -> Vec<CountBucket> {
    let mut counts = [0usize; AGE_BOUNDARIES.len()];
    for &age in ages {
        let slot = AGE_BOUNDARIES
            .windows(2)
            .position(|w| w[0] <= age && age < w[1])
            .unwrap_or(AGE_BOUNDARIES.len() - 1);
        counts[slot] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .filter(|(_, n)| *n > 0)
        .map(|(i, n)| CountBucket {
            label: if i + 1 < AGE_BOUNDARIES.len() {
                AGE_BOUNDARIES[i].to_string()
            } else {
                "Unknown".to_string()
            },
            count: n,
        })
        .collect()
}

pub struct PatientService<S>
where
    S: Storage,
{
    storage: Arc<S>,
}

impl<S> PatientService<S>
where
    S: Storage,
    S::Error: Into<crate::adapters::StorageError>,
{
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// Validate and store a new patient.
    ///
    /// # Errors
    /// `Validation` if any field is out of range.
    pub fn create(&self, record: &PatientRecord) -> crate::Result<StoredPatient> {
        record
            .validate()
            .map_err(|errors| DxError::Validation(errors.join("; ")))?;
        let stored = self
            .storage
            .insert_patient(record)
            .map_err(|e| DxError::Storage(e.into()))?;
        tracing::info!("Created patient {}", stored.id);
        Ok(stored)
    }

    /// # Errors
    /// Returns error if storage operation fails.
    pub fn list(&self, filter: &PatientFilter, paging: Paging) -> crate::Result<Page<StoredPatient>> {
        self.storage
            .list_patients(filter, paging.page, paging.limit)
            .map_err(|e| DxError::Storage(e.into()))
    }

    /// Look up by opaque id or external patient id.
    ///
    /// # Errors
    /// `NotFound` if no such patient exists.
    pub fn get(&self, id: &str) -> crate::Result<StoredPatient> {
        self.storage
            .find_patient(id)
            .map_err(|e| DxError::Storage(e.into()))?
            .ok_or_else(|| DxError::NotFound("Patient not found".into()))
    }

    /// # Errors
    /// `NotFound` if no such patient exists.
    pub fn delete(&self, id: &str) -> crate::Result<()> {
        let removed = self
            .storage
            .delete_patient(id)
            .map_err(|e| DxError::Storage(e.into()))?;
        if removed {
            tracing::info!("Deleted patient {}", id);
            Ok(())
        } else {
            Err(DxError::NotFound("Patient not found".into()))
        }
    }

    /// # Errors
    /// Returns error if storage operation fails.
    pub fn stats(&self) -> crate::Result<PatientStats> {
        let count = |field: GroupField| {
            self.storage
                .count_by(field)
                .map_err(|e| DxError::Storage(e.into()))
        };

        let ages = self
            .storage
            .patient_ages()
            .map_err(|e| DxError::Storage(e.into()))?;

        Ok(PatientStats {
            total_patients: self
                .storage
                .count_patients()
                .map_err(|e| DxError::Storage(e.into()))?,
            diagnosis: count(GroupField::Diagnosis)?,
            country: count(GroupField::Country)?,
            severity: count(GroupField::Severity)?,
            gender: count(GroupField::Gender)?,
            age: age_histogram(&ages),
        })
    }
}
