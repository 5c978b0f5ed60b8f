//! Prompt construction and response parsing for the chat-completions client.

use serde::Deserialize;
use serde_json::Value;

use crate::domain::{ClinicalProfile, ImageAnalysis, ImageType, Narrative, Prediction};
use crate::ports::NarrativeError;

pub const NARRATIVE_SYSTEM: &str = "You are a medical AI assistant. Respond only with valid JSON.";
pub const IMAGE_SYSTEM: &str =
    "You are a medical imaging AI specialist. Respond only with valid JSON.";

fn joined_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "None".to_string()
    } else {
        items.join(", ")
    }
}

fn measurements<'a>(values: impl Iterator<Item = (&'a str, f64)>) -> String {
    let parts: Vec<String> = values
        .filter(|(_, v)| *v != 0.0)
        .map(|(k, v)| format!("{k}: {v}"))
        .collect();
    if parts.is_empty() {
        "Not available".to_string()
    } else {
        parts.join(", ")
    }
}

/// User message asking for a structured consult on a prediction.
#[must_use]
pub fn narrative_prompt(prediction: &Prediction, patient: &ClinicalProfile) -> String {
    let vitals = patient
        .vital_signs
        .as_ref()
        .map_or_else(|| "Not available".to_string(), |v| measurements(v.present()));
    let labs = patient
        .lab_results
        .as_ref()
        .map_or_else(|| "Not available".to_string(), |l| measurements(l.present()));
    let duration = patient
        .symptom_duration_days
        .map_or_else(|| "N/A".to_string(), |d| d.to_string());
    let differentials: Vec<String> = prediction
        .top_predictions
        .iter()
        .take(5)
        .map(|p| format!("  - {}: {}%", p.disease, p.confidence))
        .collect();

    format!(
        "You are a senior medical consultant AI assistant helping doctors with diagnosis.

PATIENT PROFILE:
- Age: {age}, Gender: {gender}
- Symptoms: {symptoms}
- Duration: {duration} days
- Existing conditions: {existing}
- Family history: {family}
- Smoking: {smoking}, Alcohol: {alcohol}
- Vital Signs: {vitals}
- Lab Results: {labs}

ML MODEL PREDICTIONS:
- Primary prediction: {disease} (confidence: {confidence}%)
- Top differential diagnoses:
{differentials}

Provide a structured medical analysis with:
1. Clinical Assessment: Brief assessment of the ML prediction in context of patient data
2. Root Cause Analysis: Detailed root cause of the predicted disease for this patient
3. Recommended Additional Tests: List of tests to confirm diagnosis
4. Treatment Plan: Suggested treatment approach (medications, lifestyle, follow-up)
5. Red Flags: Any warning signs requiring immediate attention
6. Differential Diagnoses to Consider: Other conditions to rule out

Format the response as structured JSON with keys: assessment, root_cause, recommended_tests (array), treatment_plan, red_flags (array), differential_notes.
Respond ONLY with valid JSON, no markdown.",
        age = patient.age,
        gender = patient.gender,
        symptoms = patient.symptoms.join(", "),
        existing = joined_or_none(&patient.existing_conditions),
        family = joined_or_none(&patient.family_history),
        smoking = patient.smoking,
        alcohol = patient.alcohol,
        disease = prediction.predicted_disease,
        confidence = prediction.confidence,
        differentials = differentials.join("\n"),
    )
}

/// User message asking for findings on one image.
#[must_use]
pub fn image_prompt(image_type: ImageType) -> String {
    let label = image_type.label();
    format!(
        r#"You are a senior radiologist AI assistant. Analyze this {label} and provide:

1. Image Type Confirmation: Confirm the type of medical image
2. Findings: Detailed findings from the image
3. Abnormalities: List any abnormalities detected
4. Confidence Level: Your confidence in the findings (0-100%)
5. Recommendation: Next steps or additional imaging needed

Respond ONLY with valid JSON:
{{
  "image_type": "{label}",
  "findings": "detailed findings...",
  "confidence": 85.0,
  "abnormalities_detected": ["abnormality1", "abnormality2"],
  "recommendation": "recommendation text..."
}}"#
    )
}

/// Unwrap a Markdown code fence (with or without a language tag).
#[must_use]
pub fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.rsplit_once("```")
        .map_or(body, |(inner, _)| inner)
        .trim()
}

#[derive(Deserialize)]
struct ConsultReply {
    #[serde(default)]
    assessment: String,
    #[serde(default)]
    root_cause: String,
    #[serde(default)]
    recommended_tests: Value,
    #[serde(default)]
    treatment_plan: Value,
    #[serde(default)]
    red_flags: Value,
    #[serde(default)]
    differential_notes: Value,
}

/// Strings from a JSON string or array; anything else is empty.
fn string_list(value: Value) -> Vec<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => vec![s],
        Value::Array(items) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        Value::Array(_) => string_list(value).join("; "),
        other => other.to_string(),
    }
}

/// Parse the consult reply into a narrative.
///
/// # Errors
/// `Malformed` if the content is not a JSON object with an assessment.
pub fn parse_narrative(content: &str) -> Result<Narrative, NarrativeError> {
    let reply: ConsultReply = serde_json::from_str(strip_code_fence(content))
        .map_err(|e| NarrativeError::Malformed(e.to_string()))?;
    if reply.assessment.trim().is_empty() {
        return Err(NarrativeError::Malformed("empty assessment".into()));
    }
    Ok(Narrative {
        ai_suggestion: reply.assessment,
        root_cause: reply.root_cause,
        recommended_tests: string_list(reply.recommended_tests),
        recommended_treatments: string_list(reply.treatment_plan),
        red_flags: string_list(reply.red_flags),
        differential_notes: text(reply.differential_notes),
    })
}

/// Parse the imaging reply, clamping confidence to 0..=100.
///
/// # Errors
/// `Malformed` if the content does not match the requested shape.
pub fn parse_image_analysis(content: &str) -> Result<ImageAnalysis, NarrativeError> {
    let mut analysis: ImageAnalysis = serde_json::from_str(strip_code_fence(content))
        .map_err(|e| NarrativeError::Malformed(e.to_string()))?;
    if !analysis.confidence.is_finite() {
        return Err(NarrativeError::Malformed("non-finite confidence".into()));
    }
    analysis.confidence = analysis.confidence.clamp(0.0, 100.0);
    Ok(analysis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Gender, RankedDiagnosis, VitalSigns};

    fn prediction() -> Prediction {
        Prediction {
            predicted_disease: "Type 2 Diabetes".into(),
            confidence: 92.35,
            top_predictions: vec![
                RankedDiagnosis {
                    disease: "Type 2 Diabetes".into(),
                    confidence: 92.35,
                },
                RankedDiagnosis {
                    disease: "Hypothyroidism".into(),
                    confidence: 3.1,
                },
            ],
        }
    }

    #[test]
    fn test_prompt_includes_patient_context() {
        let patient = ClinicalProfile {
            age: 45,
            gender: Gender::Male,
            symptoms: vec!["fatigue".into(), "excessive thirst".into()],
            vital_signs: Some(VitalSigns {
                heart_rate: Some(88.0),
                ..Default::default()
            }),
            ..Default::default()
        };
        let prompt = narrative_prompt(&prediction(), &patient);
        assert!(prompt.contains("Age: 45, Gender: male"));
        assert!(prompt.contains("Symptoms: fatigue, excessive thirst"));
        assert!(prompt.contains("Existing conditions: None"));
        assert!(prompt.contains("Vital Signs: heart_rate: 88"));
        assert!(prompt.contains("Lab Results: Not available"));
        assert!(prompt.contains("Primary prediction: Type 2 Diabetes (confidence: 92.35%)"));
        assert!(prompt.contains("  - Hypothyroidism: 3.1%"));
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{}\n```  "), "{}");
        assert_eq!(strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn test_parse_narrative() {
        let reply = r#"```json
{"assessment":"Consistent with T2DM","root_cause":"Insulin resistance",
 "recommended_tests":["HbA1c","Fasting glucose"],"treatment_plan":"Metformin",
 "red_flags":["DKA symptoms"],"differential_notes":"Rule out T1DM"}
```"#;
        let n = parse_narrative(reply).expect("Should parse");
        assert_eq!(n.ai_suggestion, "Consistent with T2DM");
        assert_eq!(n.recommended_tests, vec!["HbA1c", "Fasting glucose"]);
        assert_eq!(n.recommended_treatments, vec!["Metformin"]);
        assert_eq!(n.red_flags, vec!["DKA symptoms"]);
        assert_eq!(n.differential_notes, "Rule out T1DM");
    }

    #[test]
    fn test_parse_narrative_rejects_prose() {
        assert!(matches!(
            parse_narrative("The patient likely has diabetes."),
            Err(NarrativeError::Malformed(_))
        ));
        assert!(matches!(
            parse_narrative(r#"{"root_cause":"x"}"#),
            Err(NarrativeError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_image_analysis() {
        let reply = r#"{"image_type":"chest X-ray","findings":"Clear lungs","confidence":140,
                        "abnormalities_detected":[],"recommendation":"None"}"#;
        let a = parse_image_analysis(reply).expect("Should parse");
        assert!((a.confidence - 100.0).abs() < f64::EPSILON);
        assert!(parse_image_analysis("{}").is_err());
    }
}
