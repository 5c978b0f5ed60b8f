//! Built-in symptom vocabulary.
//!
//! The trained model records the vocabulary it was fitted with in its
//! metadata; this list seeds new trainings and answers symptom listings when
//! no model exists yet.

/// Recognized symptom tokens, in feature order.
pub const SYMPTOM_VOCABULARY: &[&str] = &[
    "frequent urination",
    "excessive thirst",
    "blurred vision",
    "fatigue",
    "slow wound healing",
    "numbness in extremities",
    "weight loss",
    "headache",
    "dizziness",
    "chest pain",
    "shortness of breath",
    "nosebleeds",
    "vision problems",
    "palpitations",
    "sweating",
    "nausea",
    "pain radiating to arm",
    "cough with phlegm",
    "fever",
    "chills",
    "rapid breathing",
    "swelling in ankles",
    "decreased urine output",
    "loss of appetite",
    "muscle cramps",
    "itching",
    "cold intolerance",
    "constipation",
    "dry skin",
    "hair loss",
    "depression",
    "muscle weakness",
    "rapid heartbeat",
    "anxiety",
    "tremors",
    "heat intolerance",
    "insomnia",
    "diarrhea",
    "pale skin",
    "weakness",
    "cold hands",
    "wheezing",
    "chest tightness",
    "cough",
    "difficulty breathing at night",
    "exercise intolerance",
    "abdominal pain",
    "jaundice",
    "swelling in legs",
    "dark urine",
    "high fever",
    "severe headache",
    "pain behind eyes",
    "joint pain",
    "rash",
    "vomiting",
    "persistent cough",
    "coughing blood",
    "night sweats",
    "high fever with chills",
    "light sensitivity",
    "sound sensitivity",
    "visual aura",
    "throbbing pain",
    "chronic cough",
    "frequent respiratory infections",
    "blue lips",
    "burning urination",
    "cloudy urine",
    "pelvic pain",
    "strong urine odor",
    "blood in urine",
    "heartburn",
    "acid regurgitation",
    "difficulty swallowing",
    "sore throat",
    "bloating",
    "joint swelling",
    "morning stiffness",
    "joint deformity",
    "bone pain",
    "frequent infections",
    "persistent sadness",
    "loss of interest",
    "sleep disturbance",
    "appetite changes",
    "difficulty concentrating",
    "feelings of worthlessness",
    "social withdrawal",
    // Profile symptoms of the synthetic corpus outside the list above.
    "weight gain",
    "muscle pain",
];

/// Normalize a free-text symptom token for vocabulary lookup.
#[must_use]
pub fn normalize_symptom(token: &str) -> String {
    token.trim().to_lowercase()
}
