//! CSV/XLSX patient import.
//!
//! The first row holds column names. List columns are `|`-separated and
//! columns prefixed `vs_` / `lab_` fill vital signs and lab results.

use std::collections::HashMap;
use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use thiserror::Error;

use crate::domain::{ClinicalProfile, DiagnosisRequest, LabResults, VitalSigns};
use crate::DxError;

/// Whole-file import failure.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Unsupported file format. Use CSV or Excel.")]
    UnsupportedFormat,

    #[error("Error parsing file: {0}")]
    Csv(#[from] csv::Error),

    #[error("Error parsing file: {0}")]
    Spreadsheet(String),
}

/// Accepted upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabularFormat {
    Csv,
    Spreadsheet,
}

impl TabularFormat {
    /// Pick the format from a file name's extension.
    ///
    /// # Errors
    /// `UnsupportedFormat` for anything other than `.csv`, `.xlsx`, `.xls`.
    pub fn from_filename(name: &str) -> Result<Self, ImportError> {
        let lower = name.trim().to_ascii_lowercase();
        if lower.ends_with(".csv") {
            Ok(Self::Csv)
        } else if lower.ends_with(".xlsx") || lower.ends_with(".xls") {
            Ok(Self::Spreadsheet)
        } else {
            Err(ImportError::UnsupportedFormat)
        }
    }
}

/// One data row keyed by column name.
#[derive(Debug, Clone, Default)]
pub struct TabularRow {
    /// 1-based position among data rows.
    pub row: usize,
    fields: HashMap<String, String>,
}

/// Parse every data row of an upload.
///
/// # Errors
/// Returns `ImportError` if the file cannot be parsed at all.
pub fn read_rows(bytes: &[u8], format: TabularFormat) -> Result<Vec<TabularRow>, ImportError> {
    let rows = match format {
        TabularFormat::Csv => read_csv(bytes)?,
        TabularFormat::Spreadsheet => read_spreadsheet(bytes)?,
    };
    tracing::debug!("Parsed {} data rows", rows.len());
    Ok(rows)
}

fn read_csv(bytes: &[u8]) -> Result<Vec<TabularRow>, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(bytes);
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    reader
        .records()
        .enumerate()
        .map(|(i, record)| {
            let record = record?;
            Ok(TabularRow::from_cells(
                i + 1,
                &headers,
                record.iter().map(str::to_string),
            ))
        })
        .collect()
}

fn read_spreadsheet(bytes: &[u8]) -> Result<Vec<TabularRow>, ImportError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ImportError::Spreadsheet(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ImportError::Spreadsheet("workbook has no sheets".into()))?
        .map_err(|e| ImportError::Spreadsheet(e.to_string()))?;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(Vec::new());
    };
    let headers: Vec<String> = header_row.iter().map(cell_text).collect();

    Ok(rows
        .filter(|cells| cells.iter().any(|c| !matches!(c, Data::Empty)))
        .enumerate()
        .map(|(i, cells)| TabularRow::from_cells(i + 1, &headers, cells.iter().map(cell_text)))
        .collect())
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split('|')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "y" | "1.0"
    )
}

fn parse_number(column: &str, raw: &str) -> Result<f64, DxError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| DxError::Encoding(format!("{column} must be numeric, got {raw:?}")))
}

fn parse_count(column: &str, raw: &str) -> Result<u32, DxError> {
    let value = parse_number(column, raw)?;
    if value < 0.0 || value.fract() != 0.0 || value > f64::from(u32::MAX) {
        return Err(DxError::Encoding(format!(
            "{column} must be a non-negative integer, got {raw:?}"
        )));
    }
    Ok(value as u32)
}

impl TabularRow {
    fn from_cells(row: usize, headers: &[String], cells: impl Iterator<Item = String>) -> Self {
        let fields = headers
            .iter()
            .zip(cells)
            .filter(|(h, _)| !h.is_empty())
            .map(|(h, v)| (h.trim().to_ascii_lowercase(), v))
            .collect();
        Self { row, fields }
    }

    /// Non-empty value of `column`.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .get(column)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// `first_name last_name`, trimmed.
    #[must_use]
    pub fn patient_name(&self) -> String {
        format!(
            "{} {}",
            self.get("first_name").unwrap_or_default(),
            self.get("last_name").unwrap_or_default()
        )
        .trim()
        .to_string()
    }

    /// Build a diagnosis request from this row.
    ///
    /// Missing age is 0 and missing gender is male.
    ///
    /// # Errors
    /// `Encoding` if a numeric column holds a non-numeric value.
    pub fn to_request(&self) -> Result<DiagnosisRequest, DxError> {
        let age = self.get("age").map_or(Ok(0), |v| parse_count("age", v))?;
        let symptom_duration_days = self
            .get("symptom_duration_days")
            .map(|v| parse_count("symptom_duration_days", v))
            .transpose()?;

        let mut vitals = VitalSigns::default();
        let mut labs = LabResults::default();
        for (column, raw) in &self.fields {
            if raw.trim().is_empty() {
                continue;
            }
            if let Some(name) = column.strip_prefix("vs_") {
                vitals.set(name, parse_number(column, raw)?);
            } else if let Some(name) = column.strip_prefix("lab_") {
                labs.set(name, parse_number(column, raw)?);
            }
        }

        let clinical = ClinicalProfile {
            age,
            gender: self.get("gender").unwrap_or("male").into(),
            smoking: self.get("smoking").is_some_and(parse_flag),
            alcohol: self.get("alcohol").is_some_and(parse_flag),
            existing_conditions: self.get("existing_conditions").map(parse_list).unwrap_or_default(),
            family_history: self.get("family_history").map(parse_list).unwrap_or_default(),
            symptoms: self.get("symptoms").map(parse_list).unwrap_or_default(),
            symptom_duration_days,
            vital_signs: (!vitals.is_empty()).then_some(vitals),
            lab_results: (!labs.is_empty()).then_some(labs),
        };

        Ok(DiagnosisRequest {
            patient_id: self.get("patient_id").map(str::to_string),
            clinical,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Gender;

    const CSV: &str = "\
first_name,last_name,age,gender,smoking,symptoms,vs_heart_rate,lab_hba1c,vs_unknown
Asha,Rao,45,Female,yes,fatigue | excessive thirst,88,7.1,3
Ben,,abc,male,0,cough,,,
";

    #[test]
    fn test_format_from_filename() {
        assert_eq!(TabularFormat::from_filename("a.CSV").expect("Should match"), TabularFormat::Csv);
        assert_eq!(
            TabularFormat::from_filename("b.xlsx").expect("Should match"),
            TabularFormat::Spreadsheet
        );
        assert!(matches!(
            TabularFormat::from_filename("c.json"),
            Err(ImportError::UnsupportedFormat)
        ));
    }

    #[test]
    fn test_csv_rows_become_requests() {
        let rows = read_rows(CSV.as_bytes(), TabularFormat::Csv).expect("Should parse");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row, 1);
        assert_eq!(rows[0].patient_name(), "Asha Rao");
        assert_eq!(rows[1].patient_name(), "Ben");

        let req = rows[0].to_request().expect("Should convert");
        assert_eq!(req.clinical.age, 45);
        assert_eq!(req.clinical.gender, Gender::Female);
        assert!(req.clinical.smoking);
        assert!(!req.clinical.alcohol);
        assert_eq!(req.clinical.symptoms, vec!["fatigue", "excessive thirst"]);
        let vitals = req.clinical.vital_signs.expect("Should have vitals");
        assert_eq!(vitals.heart_rate, Some(88.0));
        assert_eq!(req.clinical.lab_results.and_then(|l| l.hba1c), Some(7.1));
    }

    #[test]
    fn test_bad_age_is_a_row_error() {
        let rows = read_rows(CSV.as_bytes(), TabularFormat::Csv).expect("Should parse");
        assert!(matches!(rows[1].to_request(), Err(DxError::Encoding(_))));
    }

    #[test]
    fn test_defaults_for_missing_columns() {
        let rows = read_rows(b"symptoms\ncough\n", TabularFormat::Csv).expect("Should parse");
        let req = rows[0].to_request().expect("Should convert");
        assert_eq!(req.clinical.age, 0);
        assert_eq!(req.clinical.gender, Gender::Male);
        assert!(req.clinical.vital_signs.is_none());
        assert!(req.clinical.lab_results.is_none());
    }

    #[test]
    fn test_garbage_spreadsheet_fails_whole_file() {
        assert!(matches!(
            read_rows(b"not a zip", TabularFormat::Spreadsheet),
            Err(ImportError::Spreadsheet(_))
        ));
    }
}
