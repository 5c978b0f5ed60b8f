//! Synthetic labeled corpus.
//!
//! Each record draws a disease profile uniformly, then samples symptoms,
//! severity, vitals and labs from that profile over population-normal
//! baselines. A fixed seed reproduces the corpus exactly; class balance is
//! not enforced.

pub mod corpus;
pub mod demographics;
pub mod profiles;
pub mod sampling;

use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::domain::{
    BloodGroup, ClinicalProfile, Gender, LabResults, PatientRecord, VitalSigns,
};
use demographics::NamePool;
use profiles::{DiseaseProfile, DISEASE_PROFILES};
use sampling::{chance, clipped_normal, gauss, pick, round_to, sample, uniform, weighted_index};

pub use profiles::{all_symptoms, disease_names};

/// Seed of the reference corpus.
pub const DEFAULT_SEED: u64 = 42;

/// Probability that a record carries a couple of symptoms from other
/// diseases.
const NOISE_SYMPTOM_RATE: f64 = 0.2;

/// Share of records generated without a vitals panel.
const MISSING_VITALS_RATE: f64 = 0.2;

/// Share of records generated without a lab panel.
const MISSING_LABS_RATE: f64 = 0.3;

/// Generate `n` records with the reference seed.
#[must_use]
pub fn generate(n: usize) -> Vec<PatientRecord> {
    generate_at(n, DEFAULT_SEED, Utc::now())
}

/// Generate `n` records with an explicit seed and reference time.
#[must_use]
pub fn generate_at(n: usize, seed: u64, now: DateTime<Utc>) -> Vec<PatientRecord> {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let noise_pool = all_symptoms();

    let mut records: Vec<PatientRecord> = (0..n)
        .map(|idx| generate_record(&mut rng, idx, n, now, &noise_pool))
        .collect();
    records.shuffle(&mut rng);

    tracing::debug!("Generated {} synthetic records (seed {})", records.len(), seed);
    records
}

fn generate_record(
    rng: &mut ChaCha20Rng,
    idx: usize,
    n: usize,
    now: DateTime<Utc>,
    noise_pool: &[&'static str],
) -> PatientRecord {
    let profile = &DISEASE_PROFILES[rng.gen_range(0..DISEASE_PROFILES.len())];

    // First 70% of indices are domestic.
    let domestic = idx * 10 < n * 7;
    let (country, state, city, names) = if domestic {
        let (state, cities) = demographics::INDIAN_STATES
            [rng.gen_range(0..demographics::INDIAN_STATES.len())];
        let city = pick(rng, cities).copied().unwrap_or("Unknown");
        ("India", state, city, demographics::INDIAN_NAMES)
    } else {
        let (country, state, city) = demographics::INTERNATIONAL_LOCATIONS
            [rng.gen_range(0..demographics::INTERNATIONAL_LOCATIONS.len())];
        let names = if rng.gen_bool(0.5) {
            demographics::US_NAMES
        } else {
            demographics::UK_NAMES
        };
        (country, state, city, names)
    };

    let gender = if rng.gen_bool(0.5) {
        Gender::Male
    } else {
        Gender::Female
    };
    let male = gender.is_male();
    let age = rng.gen_range(18..=85);

    let symptoms = sample_symptoms(rng, profile, noise_pool);
    let severity = DiseaseProfile::SEVERITIES[weighted_index(rng, &profile.severity_weights)];
    let smoking = chance(rng, if male { 0.25 } else { 0.08 });
    let alcohol = chance(rng, if male { 0.3 } else { 0.1 });

    let (weight, height) = if male {
        (gauss(rng, 72.0, 15.0), gauss(rng, 170.0, 8.0))
    } else {
        (gauss(rng, 62.0, 12.0), gauss(rng, 158.0, 7.0))
    };
    let weight = round_to(weight, 1).clamp(40.0, 150.0);
    let height = round_to(height, 1).clamp(140.0, 200.0);
    let bmi = round_to(weight / (height / 100.0).powi(2), 1);

    let vitals = sample_vitals(rng, profile, bmi);
    let labs = sample_labs(rng, profile, male);
    let vital_signs = (!chance(rng, MISSING_VITALS_RATE)).then_some(vitals);
    let lab_results = (!chance(rng, MISSING_LABS_RATE)).then_some(labs);

    let existing_conditions: Vec<String> = if chance(rng, 0.3) {
        let others: Vec<&str> = DISEASE_PROFILES
            .iter()
            .map(|p| p.name)
            .filter(|name| *name != profile.name)
            .collect();
        let k = rng.gen_range(1..=2);
        sample(rng, &others, k).into_iter().map(String::from).collect()
    } else {
        Vec::new()
    };

    let family_history: Vec<String> = if chance(rng, 0.4) {
        let k = rng.gen_range(1..=3);
        sample(rng, &disease_names(), k)
            .into_iter()
            .map(String::from)
            .collect()
    } else {
        Vec::new()
    };

    let current_medications: Vec<String> = if !existing_conditions.is_empty() || chance(rng, 0.2)
    {
        let k = rng.gen_range(1..=3);
        sample(rng, demographics::MEDICATIONS, k)
            .into_iter()
            .map(String::from)
            .collect()
    } else {
        Vec::new()
    };

    let k = rng.gen_range(0..=2);
    let drawn = sample(rng, demographics::ALLERGIES, k);
    let allergies: Vec<String> = if drawn.contains(&"None") {
        Vec::new()
    } else {
        drawn.into_iter().map(String::from).collect()
    };

    let created = now - Duration::days(rng.gen_range(0..=365));
    let (first_name, last_name) = sample_name(rng, &names, male);

    let clinical = ClinicalProfile {
        age,
        gender,
        smoking,
        alcohol,
        existing_conditions,
        family_history,
        symptoms,
        symptom_duration_days: Some(rng.gen_range(1..=60)),
        vital_signs,
        lab_results,
    };

    let mut record = PatientRecord::new(first_name.clone(), last_name.clone(), clinical);
    record.patient_id = Some(format!("EP{idx:05}"));
    record.blood_group = pick(rng, &BloodGroup::ALL).copied();
    record.country = country.to_string();
    record.state = Some(state.to_string());
    record.city = Some(city.to_string());
    record.contact = Some(format!(
        "{} {}",
        demographics::phone_prefix(country),
        rng.gen_range(6_000_000_000u64..10_000_000_000)
    ));
    record.email = Some(format!(
        "{}.{}{}@{}",
        first_name.to_lowercase(),
        last_name.to_lowercase(),
        idx,
        names.email_domain
    ));
    record.weight_kg = Some(weight);
    record.height_cm = Some(height);
    record.current_medications = current_medications;
    record.allergies = allergies;
    record.diagnosis = Some(profile.name.to_string());
    record.severity = Some(severity);
    record.treatment = pick(rng, profile.treatments).map(|t| (*t).to_string());
    record.root_cause = Some(profile.root_cause.to_string());
    record.created_at = Some(created);
    record.updated_at = Some(created);
    record
}

fn sample_symptoms(
    rng: &mut ChaCha20Rng,
    profile: &DiseaseProfile,
    noise_pool: &[&'static str],
) -> Vec<String> {
    let upper = profile.symptoms.len().min(6);
    let k = rng.gen_range(3..=upper);
    let mut symptoms = sample(rng, profile.symptoms, k);

    if chance(rng, NOISE_SYMPTOM_RATE) {
        let candidates: Vec<&str> = noise_pool
            .iter()
            .copied()
            .filter(|s| !symptoms.contains(s))
            .collect();
        symptoms.extend(sample(rng, &candidates, 2));
    }

    symptoms.into_iter().map(String::from).collect()
}

fn sample_vitals(rng: &mut ChaCha20Rng, profile: &DiseaseProfile, bmi: f64) -> VitalSigns {
    let mut vitals = VitalSigns {
        blood_pressure_systolic: Some(gauss(rng, 125.0, 20.0).round()),
        blood_pressure_diastolic: Some(gauss(rng, 80.0, 12.0).round()),
        heart_rate: Some(gauss(rng, 78.0, 12.0).round()),
        temperature: Some(round_to(gauss(rng, 98.6, 0.8), 1)),
        respiratory_rate: Some(gauss(rng, 16.0, 3.0).round()),
        oxygen_saturation: Some(round_to(gauss(rng, 97.0, 2.0), 1)),
        bmi: Some(bmi),
    };

    for (name, low, high) in profile.vital_markers {
        vitals.set(name, uniform(rng, *low, *high).round());
    }
    if profile.febrile {
        vitals.temperature = Some(round_to(uniform(rng, 100.0, 104.0), 1));
    }
    vitals
}

fn sample_labs(rng: &mut ChaCha20Rng, profile: &DiseaseProfile, male: bool) -> LabResults {
    // (name, mean, sd, decimals)
    let baseline: [(&str, f64, f64, i32); 28] = [
        ("hemoglobin", if male { 14.0 } else { 12.5 }, 1.5, 1),
        ("wbc_count", 7500.0, 2000.0, 0),
        ("rbc_count", if male { 5.0 } else { 4.5 }, 0.5, 2),
        ("platelet_count", 250_000.0, 60000.0, 0),
        ("blood_sugar_fasting", 95.0, 15.0, 1),
        ("blood_sugar_pp", 130.0, 25.0, 1),
        ("hba1c", 5.5, 0.6, 1),
        ("cholesterol_total", 195.0, 30.0, 1),
        ("cholesterol_hdl", 50.0, 10.0, 1),
        ("cholesterol_ldl", 120.0, 25.0, 1),
        ("triglycerides", 140.0, 40.0, 1),
        ("creatinine", 1.0, 0.3, 2),
        ("urea", 30.0, 10.0, 1),
        ("uric_acid", 5.5, 1.5, 1),
        ("sgot", 28.0, 10.0, 1),
        ("sgpt", 30.0, 12.0, 1),
        ("alkaline_phosphatase", 80.0, 25.0, 1),
        ("bilirubin_total", 0.8, 0.3, 2),
        ("albumin", 4.0, 0.5, 1),
        ("tsh", 2.5, 1.0, 2),
        ("t3", 1.2, 0.3, 2),
        ("t4", 1.0, 0.2, 2),
        ("vitamin_d", 35.0, 15.0, 1),
        ("vitamin_b12", 500.0, 150.0, 1),
        ("iron", 90.0, 30.0, 1),
        ("calcium", 9.5, 0.8, 1),
        ("sodium", 140.0, 3.0, 1),
        ("potassium", 4.2, 0.5, 1),
    ];

    let mut labs = LabResults::default();
    for (name, mean, sd, decimals) in baseline {
        labs.set(name, round_to(gauss(rng, mean, sd), decimals));
    }
    for (name, low, high) in profile.lab_markers {
        labs.set(name, round_to(clipped_normal(rng, *low, *high), 2));
    }
    labs
}

fn sample_name(rng: &mut ChaCha20Rng, names: &NamePool, male: bool) -> (String, String) {
    let firsts = if male { names.male } else { names.female };
    let first = pick(rng, firsts).copied().unwrap_or("Alex");
    let last = pick(rng, names.last).copied().unwrap_or("Doe");
    (first.to_string(), last.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn fixed_now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-06-01T12:00:00Z")
            .expect("Should parse")
            .with_timezone(&Utc)
    }

    #[test]
    fn test_same_seed_same_corpus() {
        let a = generate_at(50, 42, fixed_now());
        let b = generate_at(50, 42, fixed_now());
        let a = serde_json::to_string(&a).expect("Should serialize");
        let b = serde_json::to_string(&b).expect("Should serialize");
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seed_differs() {
        let a = serde_json::to_string(&generate_at(20, 1, fixed_now())).expect("Should serialize");
        let b = serde_json::to_string(&generate_at(20, 2, fixed_now())).expect("Should serialize");
        assert_ne!(a, b);
    }

    #[test]
    fn test_record_shape() {
        let records = generate_at(200, 42, fixed_now());
        assert_eq!(records.len(), 200);

        let ids: HashSet<_> = records.iter().filter_map(|r| r.patient_id.clone()).collect();
        assert_eq!(ids.len(), 200);
        assert!(ids.contains("EP00000"));
        assert!(ids.contains("EP00199"));

        let names: HashSet<_> = disease_names().into_iter().collect();
        for r in &records {
            let label = r.label().expect("Should be labeled");
            assert!(names.contains(label));
            assert!(r.clinical.symptoms.len() >= 3 && r.clinical.symptoms.len() <= 8);
            assert!((18..=85).contains(&r.clinical.age));
            assert!(r.validate().is_ok());
        }

        let domestic = records.iter().filter(|r| r.country == "India").count();
        assert_eq!(domestic, 140);
    }

    #[test]
    fn test_disease_markers_applied() {
        let records = generate_at(400, 42, fixed_now());
        for r in &records {
            let Some(labs) = &r.clinical.lab_results else {
                continue;
            };
            if r.label() == Some("Type 2 Diabetes") {
                let hba1c = labs.hba1c.expect("Should have hba1c");
                assert!((6.5..=12.0).contains(&hba1c));
            }
        }
        for r in &records {
            let Some(vitals) = &r.clinical.vital_signs else {
                continue;
            };
            if r.label() == Some("Dengue Fever") {
                let t = vitals.temperature.expect("Should have temperature");
                assert!((100.0..=104.0).contains(&t));
            }
        }
    }

    #[test]
    fn test_panels_are_sometimes_omitted() {
        let records = generate_at(1000, 42, fixed_now());
        let no_vitals = records.iter().filter(|r| r.clinical.vital_signs.is_none()).count();
        let no_labs = records.iter().filter(|r| r.clinical.lab_results.is_none()).count();

        assert!((150..=250).contains(&no_vitals), "vitals omitted {no_vitals} times");
        assert!((240..=360).contains(&no_labs), "labs omitted {no_labs} times");
        assert!(records
            .iter()
            .filter_map(|r| r.clinical.vital_signs.as_ref())
            .all(|v| !v.is_empty()));
    }

    #[test]
    fn test_noise_adds_at_most_two_foreign_symptoms() {
        let records = generate_at(500, 42, fixed_now());
        let mut noisy = 0usize;
        for r in &records {
            let profile = DISEASE_PROFILES
                .iter()
                .find(|p| Some(p.name) == r.label())
                .expect("Should have profile");
            let foreign = r
                .clinical
                .symptoms
                .iter()
                .filter(|s| !profile.symptoms.contains(&s.as_str()))
                .count();
            assert!(foreign <= 2);
            if foreign > 0 {
                noisy += 1;
            }
        }
        assert!((50..=140).contains(&noisy), "{noisy} noisy records");
    }

    #[test]
    fn test_corpus_is_shuffled() {
        let records = generate_at(100, 42, fixed_now());
        let in_order = records
            .iter()
            .enumerate()
            .all(|(i, r)| r.patient_id.as_deref() == Some(format!("EP{i:05}").as_str()));
        assert!(!in_order);
    }
}
