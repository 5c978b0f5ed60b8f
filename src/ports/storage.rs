//! Storage port: Trait for persistent storage operations.
//!
//! This trait abstracts the storage backend (SQLite) from the application logic.

use serde::Serialize;

use crate::domain::{DiagnosisEntry, ImageAnalysisEntry, PatientRecord, StoredPatient};

/// One page of a listing with pagination metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Count of all matching items
    pub total: usize,
    /// 1-based page number
    pub page: usize,
    pub limit: usize,
    /// Number of pages at this limit
    pub pages: usize,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(items: Vec<T>, total: usize, page: usize, limit: usize) -> Self {
        let pages = if limit == 0 { 0 } else { total.div_ceil(limit) };
        Self {
            items,
            total,
            page,
            limit,
            pages,
        }
    }

    /// Zero-based row offset of a 1-based page.
    #[must_use]
    pub fn offset(page: usize, limit: usize) -> usize {
        page.saturating_sub(1) * limit
    }
}

pub const DEFAULT_PAGE_LIMIT: usize = 20;
pub const MAX_PAGE_LIMIT: usize = 100;

/// Requested page, clamped to `page >= 1` and `1 <= limit <= 100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub page: usize,
    pub limit: usize,
}

impl Paging {
    #[must_use]
    pub fn new(page: Option<usize>, limit: Option<usize>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT),
        }
    }
}

impl Default for Paging {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Listing filter. Every set field must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientFilter {
    /// Case-insensitive substring of first name, last name or patient id.
    pub search: Option<String>,
    /// Case-insensitive substring of the diagnosis.
    pub diagnosis: Option<String>,
    /// Case-insensitive substring of the country.
    pub country: Option<String>,
}

/// Field a grouped count is taken over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupField {
    Diagnosis,
    Country,
    Severity,
    Gender,
}

/// A grouped count. Sorted by `count` descending in results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountBucket {
    pub label: String,
    pub count: usize,
}

/// Trait for patient and history persistence.
pub trait Storage: Send + Sync {
    /// Error type for storage operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Store a new patient and return it with its opaque id.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn insert_patient(&self, record: &PatientRecord) -> Result<StoredPatient, Self::Error>;

    /// Store many patients in one transaction.
    ///
    /// # Errors
    /// Returns error if storage operation fails; nothing is stored then.
    fn insert_patients(&self, records: &[PatientRecord]) -> Result<usize, Self::Error>;

    /// Find by opaque id, falling back to the external `patient_id`.
    fn find_patient(&self, id: &str) -> Result<Option<StoredPatient>, Self::Error>;

    /// Page through patients, newest first.
    fn list_patients(
        &self,
        filter: &PatientFilter,
        page: usize,
        limit: usize,
    ) -> Result<Page<StoredPatient>, Self::Error>;

    /// Overwrite a stored patient. Returns `false` if the id is unknown.
    fn update_patient(&self, patient: &StoredPatient) -> Result<bool, Self::Error>;

    /// Delete by opaque id or `patient_id`. Returns `false` if nothing matched.
    fn delete_patient(&self, id: &str) -> Result<bool, Self::Error>;

    fn count_patients(&self) -> Result<usize, Self::Error>;

    /// Count patients with a non-blank diagnosis.
    fn count_labeled(&self) -> Result<usize, Self::Error>;

    /// All patients with a non-blank diagnosis, oldest first.
    fn labeled_patients(&self) -> Result<Vec<PatientRecord>, Self::Error>;

    /// All patients, oldest first.
    fn all_patients(&self) -> Result<Vec<StoredPatient>, Self::Error>;

    /// Delete every patient. Returns the number removed.
    fn clear_patients(&self) -> Result<usize, Self::Error>;

    /// Swap the whole patient table for `records` in one transaction.
    ///
    /// A record that cannot be stored is skipped; the rest still land.
    /// Returns the number stored.
    ///
    /// # Errors
    /// Returns error if the swap fails; the previous patients are kept then.
    fn replace_patients(&self, records: &[PatientRecord]) -> Result<usize, Self::Error>;

    /// Grouped counts over `field`, null keys skipped, largest first.
    fn count_by(&self, field: GroupField) -> Result<Vec<CountBucket>, Self::Error>;

    /// Ages of all patients.
    fn patient_ages(&self) -> Result<Vec<u32>, Self::Error>;

    /// Append a diagnosis history entry.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn append_diagnosis(&self, entry: &DiagnosisEntry) -> Result<(), Self::Error>;

    /// Page through diagnosis history, newest first.
    fn diagnosis_history(&self, page: usize, limit: usize)
        -> Result<Page<DiagnosisEntry>, Self::Error>;

    /// Append an image analysis entry.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn append_image_analysis(&self, entry: &ImageAnalysisEntry) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_counts() {
        let page = Page::new(vec![1, 2, 3], 45, 2, 20);
        assert_eq!(page.pages, 3);
        assert_eq!(Page::<u8>::new(vec![], 0, 1, 20).pages, 0);
        assert_eq!(Page::<u8>::new(vec![], 40, 1, 20).pages, 2);
    }

    #[test]
    fn test_paging_clamps() {
        assert_eq!(Paging::default(), Paging { page: 1, limit: 20 });
        assert_eq!(Paging::new(Some(0), Some(0)), Paging { page: 1, limit: 1 });
        assert_eq!(Paging::new(Some(4), Some(500)), Paging { page: 4, limit: 100 });
    }

    #[test]
    fn test_offset() {
        assert_eq!(Page::<u8>::offset(1, 20), 0);
        assert_eq!(Page::<u8>::offset(3, 10), 20);
        assert_eq!(Page::<u8>::offset(0, 10), 0);
    }
}
