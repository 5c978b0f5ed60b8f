//! Patient record types.
//!
//! `ClinicalProfile` is the part of a record the classifier sees. It is
//! embedded (flattened) in both stored records and diagnosis requests so the
//! two paths hand the encoder the exact same shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Patient gender.
///
/// Parsing is case-insensitive; unrecognized tokens become `Other`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Other,
}

impl Gender {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
        }
    }

    #[must_use]
    pub fn is_male(&self) -> bool {
        matches!(self, Self::Male)
    }
}

impl From<&str> for Gender {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "male" => Self::Male,
            "female" => Self::Female,
            _ => Self::Other,
        }
    }
}

impl From<String> for Gender {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ABO/Rh blood group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BloodGroup {
    #[serde(rename = "A+")]
    APos,
    #[serde(rename = "A-")]
    ANeg,
    #[serde(rename = "B+")]
    BPos,
    #[serde(rename = "B-")]
    BNeg,
    #[serde(rename = "O+")]
    OPos,
    #[serde(rename = "O-")]
    ONeg,
    #[serde(rename = "AB+")]
    AbPos,
    #[serde(rename = "AB-")]
    AbNeg,
}

impl BloodGroup {
    pub const ALL: [BloodGroup; 8] = [
        Self::APos,
        Self::ANeg,
        Self::BPos,
        Self::BNeg,
        Self::OPos,
        Self::ONeg,
        Self::AbPos,
        Self::AbNeg,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::APos => "A+",
            Self::ANeg => "A-",
            Self::BPos => "B+",
            Self::BNeg => "B-",
            Self::OPos => "O+",
            Self::ONeg => "O-",
            Self::AbPos => "AB+",
            Self::AbNeg => "AB-",
        }
    }
}

/// Disease severity attached to a labeled record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
}

impl Severity {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mild => "Mild",
            Self::Moderate => "Moderate",
            Self::Severe => "Severe",
        }
    }
}

/// Declares a panel of optional named measurements together with its
/// canonical name order and by-name accessors.
macro_rules! measurement_panel {
    ($(#[$meta:meta])* $panel:ident, $names:ident { $($field:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        #[serde(default)]
        pub struct $panel {
            $(pub $field: Option<f64>,)+
        }

        /// Canonical order of the panel's measurements.
        pub const $names: &[&str] = &[$(stringify!($field)),+];

        impl $panel {
            /// Look up a measurement by its canonical name.
            #[must_use]
            pub fn get(&self, name: &str) -> Option<f64> {
                match name {
                    $(stringify!($field) => self.$field,)+
                    _ => None,
                }
            }

            /// Set a measurement by name. Returns `false` for unknown names.
            pub fn set(&mut self, name: &str, value: f64) -> bool {
                match name {
                    $(stringify!($field) => {
                        self.$field = Some(value);
                        true
                    })+
                    _ => false,
                }
            }

            /// Present measurements in canonical order.
            pub fn present(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
                $names
                    .iter()
                    .filter_map(move |name| self.get(name).map(|v| (*name, v)))
            }

            #[must_use]
            pub fn is_empty(&self) -> bool {
                true $(&& self.$field.is_none())+
            }
        }
    };
}

measurement_panel!(
    /// Vital signs taken at intake.
    VitalSigns,
    VITAL_FEATURES {
        blood_pressure_systolic,
        blood_pressure_diastolic,
        heart_rate,
        temperature,
        respiratory_rate,
        oxygen_saturation,
        bmi,
    }
);

measurement_panel!(
    /// Laboratory panel results.
    LabResults,
    LAB_FEATURES {
        hemoglobin,
        wbc_count,
        rbc_count,
        platelet_count,
        blood_sugar_fasting,
        blood_sugar_pp,
        hba1c,
        cholesterol_total,
        cholesterol_hdl,
        cholesterol_ldl,
        triglycerides,
        creatinine,
        urea,
        uric_acid,
        sgot,
        sgpt,
        alkaline_phosphatase,
        bilirubin_total,
        albumin,
        tsh,
        t3,
        t4,
        vitamin_d,
        vitamin_b12,
        iron,
        calcium,
        sodium,
        potassium,
    }
);

/// The clinical features of a patient that the classifier consumes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClinicalProfile {
    #[serde(default)]
    pub age: u32,

    #[serde(default)]
    pub gender: Gender,

    #[serde(default)]
    pub smoking: bool,

    #[serde(default)]
    pub alcohol: bool,

    #[serde(default)]
    pub existing_conditions: Vec<String>,

    #[serde(default)]
    pub family_history: Vec<String>,

    #[serde(default)]
    pub symptoms: Vec<String>,

    #[serde(default)]
    pub symptom_duration_days: Option<u32>,

    #[serde(default)]
    pub vital_signs: Option<VitalSigns>,

    #[serde(default)]
    pub lab_results: Option<LabResults>,
}

impl ClinicalProfile {
    /// Validate ranges of the clinical fields.
    ///
    /// # Errors
    /// Returns validation errors as a vector of strings.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.age > 120 {
            errors.push(format!("Age {} out of range [0, 120]", self.age));
        }

        let panels = self
            .vital_signs
            .iter()
            .flat_map(VitalSigns::present)
            .chain(self.lab_results.iter().flat_map(LabResults::present));
        for (name, value) in panels {
            if !value.is_finite() {
                errors.push(format!("{name} must be a finite number"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn default_country() -> String {
    "India".to_string()
}

/// A patient record as captured at intake or produced by the generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientRecord {
    #[serde(default)]
    pub patient_id: Option<String>,

    pub first_name: String,

    pub last_name: String,

    #[serde(flatten)]
    pub clinical: ClinicalProfile,

    #[serde(default)]
    pub blood_group: Option<BloodGroup>,

    #[serde(default = "default_country")]
    pub country: String,

    #[serde(default)]
    pub state: Option<String>,

    #[serde(default)]
    pub city: Option<String>,

    #[serde(default)]
    pub contact: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub weight_kg: Option<f64>,

    #[serde(default)]
    pub height_cm: Option<f64>,

    #[serde(default)]
    pub current_medications: Vec<String>,

    #[serde(default)]
    pub allergies: Vec<String>,

    #[serde(default)]
    pub diagnosis: Option<String>,

    #[serde(default)]
    pub severity: Option<Severity>,

    #[serde(default)]
    pub treatment: Option<String>,

    #[serde(default)]
    pub root_cause: Option<String>,

    #[serde(default)]
    pub confidence: Option<f64>,

    #[serde(default)]
    pub ai_suggestion: Option<String>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl PatientRecord {
    /// Create a minimal record; everything else takes its default.
    #[must_use]
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        clinical: ClinicalProfile,
    ) -> Self {
        Self {
            patient_id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            clinical,
            blood_group: None,
            country: default_country(),
            state: None,
            city: None,
            contact: None,
            email: None,
            weight_kg: None,
            height_cm: None,
            current_medications: Vec::new(),
            allergies: Vec::new(),
            diagnosis: None,
            severity: None,
            treatment: None,
            root_cause: None,
            confidence: None,
            ai_suggestion: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// The diagnosis label, if present and non-blank.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.diagnosis
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }

    /// `first_name last_name`, trimmed.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Validate intake fields.
    ///
    /// # Errors
    /// Returns validation errors as a vector of strings.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = match self.clinical.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => errors,
        };

        if self.first_name.trim().is_empty() {
            errors.push("first_name must not be empty".to_string());
        }
        if self.last_name.trim().is_empty() {
            errors.push("last_name must not be empty".to_string());
        }
        if let Some(w) = self.weight_kg {
            if !(w.is_finite() && w > 0.0) {
                errors.push(format!("Weight {w} must be a positive number"));
            }
        }
        if let Some(h) = self.height_cm {
            if !(h.is_finite() && h > 0.0) {
                errors.push(format!("Height {h} must be a positive number"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// A record as held by storage: opaque id plus the record itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredPatient {
    pub id: String,

    #[serde(flatten)]
    pub record: PatientRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_parsing_is_case_insensitive() {
        assert_eq!(Gender::from("Male"), Gender::Male);
        assert_eq!(Gender::from(" MALE "), Gender::Male);
        assert_eq!(Gender::from("female"), Gender::Female);
        assert_eq!(Gender::from("m"), Gender::Other);
        assert_eq!(Gender::from("unknown"), Gender::Other);
    }

    #[test]
    fn test_panel_accessors() {
        let mut vitals = VitalSigns::default();
        assert!(vitals.is_empty());
        assert!(vitals.set("heart_rate", 72.0));
        assert!(!vitals.set("pulse", 72.0));
        assert_eq!(vitals.get("heart_rate"), Some(72.0));
        assert_eq!(vitals.get("bmi"), None);
        assert!(!vitals.is_empty());

        let present: Vec<_> = vitals.present().collect();
        assert_eq!(present, vec![("heart_rate", 72.0)]);
    }

    #[test]
    fn test_panel_names() {
        assert_eq!(VITAL_FEATURES.len(), 7);
        assert_eq!(LAB_FEATURES.len(), 28);
        assert_eq!(LAB_FEATURES[0], "hemoglobin");
        assert_eq!(LAB_FEATURES[27], "potassium");
    }

    #[test]
    fn test_record_deserializes_flat_json() {
        let json = r#"{
            "first_name": "Asha",
            "last_name": "Rao",
            "age": 45,
            "gender": "Female",
            "symptoms": ["fatigue"],
            "vital_signs": {"heart_rate": 80},
            "blood_group": "AB+"
        }"#;
        let record: PatientRecord = serde_json::from_str(json).expect("Should parse");
        assert_eq!(record.clinical.age, 45);
        assert_eq!(record.clinical.gender, Gender::Female);
        assert_eq!(record.country, "India");
        assert_eq!(record.blood_group, Some(BloodGroup::AbPos));
        let vitals = record.clinical.vital_signs.expect("Should have vitals");
        assert_eq!(vitals.heart_rate, Some(80.0));
        assert_eq!(vitals.bmi, None);
    }

    #[test]
    fn test_validation() {
        let valid = PatientRecord::new(
            "Asha",
            "Rao",
            ClinicalProfile {
                age: 45,
                ..Default::default()
            },
        );
        assert!(valid.validate().is_ok());

        let invalid = PatientRecord::new(
            " ",
            "Rao",
            ClinicalProfile {
                age: 130,
                ..Default::default()
            },
        );
        let errors = invalid.validate().expect_err("Should fail");
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_label_ignores_blank_diagnosis() {
        let mut record = PatientRecord::new("A", "B", ClinicalProfile::default());
        assert_eq!(record.label(), None);
        record.diagnosis = Some("  ".to_string());
        assert_eq!(record.label(), None);
        record.diagnosis = Some("Asthma".to_string());
        assert_eq!(record.label(), Some("Asthma"));
    }
}
