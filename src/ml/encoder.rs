//! Feature encoding: patient profile to fixed-order numeric vector.
//!
//! The vector layout is
//! `[age, gender_male, smoking, alcohol, num_existing_conditions,
//! num_family_history, symptom_duration_days]` followed by one-hot symptom
//! presence, vital signs and lab results, each in the order recorded in
//! [`ModelMetadata`]. Training and inference both go through
//! [`FeatureEncoder::encode`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::vocabulary::{normalize_symptom, SYMPTOM_VOCABULARY};
use crate::domain::{ClinicalProfile, LAB_FEATURES, VITAL_FEATURES};

/// Leading scalar features, in vector order.
pub const BASE_FEATURES: [&str; 7] = [
    "age",
    "gender_male",
    "smoking",
    "alcohol",
    "num_existing_conditions",
    "num_family_history",
    "symptom_duration_days",
];

/// Feature layout and class list recorded at training time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub feature_names: Vec<String>,
    pub all_symptoms: Vec<String>,
    pub vital_features: Vec<String>,
    pub lab_features: Vec<String>,
    pub classes: Vec<String>,
    /// Holdout accuracy in [0, 1].
    pub accuracy: f64,
    pub n_features: usize,
}

impl ModelMetadata {
    #[must_use]
    pub fn new(encoder: &FeatureEncoder, classes: Vec<String>, accuracy: f64) -> Self {
        let feature_names = encoder.feature_names();
        Self {
            n_features: feature_names.len(),
            feature_names,
            all_symptoms: encoder.symptoms.clone(),
            vital_features: encoder.vitals.clone(),
            lab_features: encoder.labs.clone(),
            classes,
            accuracy,
        }
    }

    /// Check that the recorded layout is self-consistent.
    ///
    /// # Errors
    /// Returns a description of the first inconsistency found.
    pub fn check(&self) -> Result<(), String> {
        let expected = BASE_FEATURES.len()
            + self.all_symptoms.len()
            + self.vital_features.len()
            + self.lab_features.len();
        if self.n_features != expected {
            return Err(format!(
                "n_features is {} but the layout has {} features",
                self.n_features, expected
            ));
        }
        if self.feature_names.len() != self.n_features {
            return Err(format!(
                "{} feature names recorded for {} features",
                self.feature_names.len(),
                self.n_features
            ));
        }
        if self.classes.is_empty() {
            return Err("metadata lists no classes".to_string());
        }
        Ok(())
    }
}

/// Deterministic profile-to-vector mapping for one feature layout.
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    symptoms: Vec<String>,
    symptom_index: HashMap<String, usize>,
    vitals: Vec<String>,
    labs: Vec<String>,
}

impl FeatureEncoder {
    #[must_use]
    pub fn new(symptoms: Vec<String>, vitals: Vec<String>, labs: Vec<String>) -> Self {
        let mut symptom_index = HashMap::with_capacity(symptoms.len());
        for (i, s) in symptoms.iter().enumerate() {
            // First occurrence wins if a vocabulary repeats a token.
            symptom_index.entry(normalize_symptom(s)).or_insert(i);
        }
        Self {
            symptoms,
            symptom_index,
            vitals,
            labs,
        }
    }

    /// Layout over the built-in vocabulary and panel orders.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(
            SYMPTOM_VOCABULARY.iter().map(|s| (*s).to_string()).collect(),
            VITAL_FEATURES.iter().map(|s| (*s).to_string()).collect(),
            LAB_FEATURES.iter().map(|s| (*s).to_string()).collect(),
        )
    }

    /// Layout recorded by a trained model.
    #[must_use]
    pub fn from_metadata(metadata: &ModelMetadata) -> Self {
        Self::new(
            metadata.all_symptoms.clone(),
            metadata.vital_features.clone(),
            metadata.lab_features.clone(),
        )
    }

    /// Vector length for this layout.
    #[must_use]
    pub fn len(&self) -> usize {
        BASE_FEATURES.len() + self.symptoms.len() + self.vitals.len() + self.labs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn symptoms(&self) -> &[String] {
        &self.symptoms
    }

    /// Feature names aligned with [`encode`](Self::encode) output.
    #[must_use]
    pub fn feature_names(&self) -> Vec<String> {
        let mut names: Vec<String> = BASE_FEATURES.iter().map(|s| (*s).to_string()).collect();
        names.extend(
            self.symptoms
                .iter()
                .map(|s| format!("sym_{}", s.replace(' ', "_"))),
        );
        names.extend(self.vitals.iter().map(|v| format!("vs_{v}")));
        names.extend(self.labs.iter().map(|l| format!("lab_{l}")));
        names
    }

    /// Encode a profile. Missing measurements encode as 0.0 and unknown
    /// symptoms are ignored, so the length is always [`len`](Self::len).
    #[must_use]
    pub fn encode(&self, profile: &ClinicalProfile) -> Vec<f64> {
        let mut features = Vec::with_capacity(self.len());

        features.push(f64::from(profile.age));
        features.push(flag(profile.gender.is_male()));
        features.push(flag(profile.smoking));
        features.push(flag(profile.alcohol));
        features.push(profile.existing_conditions.len() as f64);
        features.push(profile.family_history.len() as f64);
        features.push(f64::from(profile.symptom_duration_days.unwrap_or(0)));

        let offset = features.len();
        features.resize(offset + self.symptoms.len(), 0.0);
        for token in &profile.symptoms {
            if let Some(&i) = self.symptom_index.get(&normalize_symptom(token)) {
                features[offset + i] = 1.0;
            }
        }

        let vitals = profile.vital_signs.as_ref();
        for name in &self.vitals {
            features.push(finite_or_zero(vitals.and_then(|v| v.get(name))));
        }

        let labs = profile.lab_results.as_ref();
        for name in &self.labs {
            features.push(finite_or_zero(labs.and_then(|l| l.get(name))));
        }

        features
    }
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

fn finite_or_zero(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Gender, LabResults, VitalSigns};

    fn profile() -> ClinicalProfile {
        ClinicalProfile {
            age: 45,
            gender: Gender::Male,
            smoking: true,
            alcohol: false,
            existing_conditions: vec!["Hypertension".into()],
            family_history: vec!["Asthma".into(), "COPD".into()],
            symptoms: vec!["Fatigue".into(), "excessive thirst".into(), "glowing skin".into()],
            symptom_duration_days: Some(12),
            vital_signs: Some(VitalSigns {
                heart_rate: Some(88.0),
                ..Default::default()
            }),
            lab_results: Some(LabResults {
                hba1c: Some(7.4),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_layout_of_builtin_encoder() {
        let encoder = FeatureEncoder::builtin();
        let names = encoder.feature_names();
        assert_eq!(names.len(), encoder.len());
        assert_eq!(names[0], "age");
        assert_eq!(names[7], "sym_frequent_urination");
        assert!(names.contains(&"vs_heart_rate".to_string()));
        assert_eq!(names.last().map(String::as_str), Some("lab_potassium"));
    }

    #[test]
    fn test_encode_values() {
        let encoder = FeatureEncoder::builtin();
        let names = encoder.feature_names();
        let v = encoder.encode(&profile());
        let at = |name: &str| v[names.iter().position(|n| n == name).expect("Should exist")];

        assert!((at("age") - 45.0).abs() < f64::EPSILON);
        assert!((at("gender_male") - 1.0).abs() < f64::EPSILON);
        assert!((at("smoking") - 1.0).abs() < f64::EPSILON);
        assert!(at("alcohol").abs() < f64::EPSILON);
        assert!((at("num_existing_conditions") - 1.0).abs() < f64::EPSILON);
        assert!((at("num_family_history") - 2.0).abs() < f64::EPSILON);
        assert!((at("symptom_duration_days") - 12.0).abs() < f64::EPSILON);
        assert!((at("sym_fatigue") - 1.0).abs() < f64::EPSILON);
        assert!((at("sym_excessive_thirst") - 1.0).abs() < f64::EPSILON);
        assert!(at("sym_fever").abs() < f64::EPSILON);
        assert!((at("vs_heart_rate") - 88.0).abs() < f64::EPSILON);
        assert!(at("vs_bmi").abs() < f64::EPSILON);
        assert!((at("lab_hba1c") - 7.4).abs() < f64::EPSILON);

        let symptom_ones = v[BASE_FEATURES.len()..BASE_FEATURES.len() + SYMPTOM_VOCABULARY.len()]
            .iter()
            .filter(|&&x| x > 0.0)
            .count();
        assert_eq!(symptom_ones, 2, "unknown symptom must be dropped");
    }

    #[test]
    fn test_length_is_invariant() {
        let encoder = FeatureEncoder::builtin();
        assert_eq!(encoder.encode(&ClinicalProfile::default()).len(), encoder.len());
        assert_eq!(encoder.encode(&profile()).len(), encoder.len());
        assert!(encoder
            .encode(&ClinicalProfile::default())
            .iter()
            .all(|x| x.is_finite()));
    }

    #[test]
    fn test_only_male_sets_gender_flag() {
        let encoder = FeatureEncoder::builtin();
        for (gender, expected) in [(Gender::Male, 1.0), (Gender::Female, 0.0), (Gender::Other, 0.0)] {
            let p = ClinicalProfile {
                gender,
                ..Default::default()
            };
            assert!((encoder.encode(&p)[1] - expected).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_metadata_roundtrip_preserves_encoding() {
        let encoder = FeatureEncoder::builtin();
        let meta = ModelMetadata::new(&encoder, vec!["A".into(), "B".into()], 0.9);
        assert!(meta.check().is_ok());

        let json = serde_json::to_string(&meta).expect("Should serialize");
        let restored: ModelMetadata = serde_json::from_str(&json).expect("Should parse");
        let reloaded = FeatureEncoder::from_metadata(&restored);

        assert_eq!(encoder.encode(&profile()), reloaded.encode(&profile()));
    }

    #[test]
    fn test_metadata_order_defines_positions() {
        let encoder = FeatureEncoder::new(
            vec!["fever".into(), "cough".into()],
            vec!["temperature".into()],
            vec![],
        );
        let p = ClinicalProfile {
            symptoms: vec!["cough".into()],
            vital_signs: Some(VitalSigns {
                temperature: Some(101.2),
                ..Default::default()
            }),
            ..Default::default()
        };
        let v = encoder.encode(&p);
        assert_eq!(v.len(), 10);
        assert_eq!(&v[7..], &[0.0, 1.0, 101.2]);
    }
}
