//! Disease profiles driving the synthetic corpus.

use crate::domain::Severity;

/// Statistical profile of one disease.
#[derive(Debug, Clone, Copy)]
pub struct DiseaseProfile {
    pub name: &'static str,
    pub symptoms: &'static [&'static str],
    pub root_cause: &'static str,
    /// Mild, moderate, severe.
    pub severity_weights: [f64; 3],
    pub treatments: &'static [&'static str],
    /// Vital sign ranges sampled uniformly.
    pub vital_markers: &'static [(&'static str, f64, f64)],
    /// Lab ranges sampled as clipped normal draws.
    pub lab_markers: &'static [(&'static str, f64, f64)],
    /// Presents with a 100-104 °F temperature.
    pub febrile: bool,
}

impl DiseaseProfile {
    pub const SEVERITIES: [Severity; 3] = [Severity::Mild, Severity::Moderate, Severity::Severe];
}

pub const DISEASE_PROFILES: &[DiseaseProfile] = &[
    DiseaseProfile {
        name: "Type 2 Diabetes",
        symptoms: &[
            "frequent urination",
            "excessive thirst",
            "blurred vision",
            "fatigue",
            "slow wound healing",
            "numbness in extremities",
            "weight loss",
        ],
        root_cause: "Insulin resistance due to genetic predisposition, obesity, and sedentary lifestyle leading to impaired glucose metabolism",
        severity_weights: [0.3, 0.5, 0.2],
        treatments: &[
            "Metformin",
            "lifestyle modification",
            "dietary control",
            "regular exercise",
            "blood sugar monitoring",
        ],
        vital_markers: &[],
        lab_markers: &[
            ("blood_sugar_fasting", 140.0, 300.0),
            ("blood_sugar_pp", 200.0, 450.0),
            ("hba1c", 6.5, 12.0),
        ],
        febrile: false,
    },
    DiseaseProfile {
        name: "Hypertension",
        symptoms: &[
            "headache",
            "dizziness",
            "chest pain",
            "shortness of breath",
            "nosebleeds",
            "fatigue",
            "vision problems",
        ],
        root_cause: "Sustained elevated arterial pressure from arterial stiffness, excess sodium, stress, or renal dysfunction",
        severity_weights: [0.35, 0.4, 0.25],
        treatments: &[
            "ACE inhibitors",
            "ARBs",
            "calcium channel blockers",
            "diuretics",
            "low-sodium diet",
            "stress management",
        ],
        vital_markers: &[
            ("blood_pressure_systolic", 140.0, 200.0),
            ("blood_pressure_diastolic", 90.0, 130.0),
        ],
        lab_markers: &[],
        febrile: false,
    },
    DiseaseProfile {
        name: "Coronary Artery Disease",
        symptoms: &[
            "chest pain",
            "shortness of breath",
            "fatigue",
            "palpitations",
            "sweating",
            "nausea",
            "pain radiating to arm",
        ],
        root_cause: "Atherosclerotic plaque buildup in coronary arteries reducing myocardial blood supply",
        severity_weights: [0.2, 0.4, 0.4],
        treatments: &[
            "statins",
            "aspirin",
            "beta-blockers",
            "angioplasty",
            "CABG surgery",
            "lifestyle changes",
        ],
        vital_markers: &[],
        lab_markers: &[
            ("cholesterol_total", 240.0, 350.0),
            ("cholesterol_ldl", 160.0, 250.0),
            ("triglycerides", 200.0, 400.0),
        ],
        febrile: false,
    },
    DiseaseProfile {
        name: "Pneumonia",
        symptoms: &[
            "cough with phlegm",
            "fever",
            "chest pain",
            "shortness of breath",
            "fatigue",
            "chills",
            "rapid breathing",
        ],
        root_cause: "Bacterial or viral infection causing alveolar inflammation and fluid accumulation in lungs",
        severity_weights: [0.3, 0.4, 0.3],
        treatments: &[
            "antibiotics",
            "antiviral medication",
            "rest",
            "hydration",
            "oxygen therapy",
            "bronchodilators",
        ],
        vital_markers: &[],
        lab_markers: &[("wbc_count", 12000.0, 25000.0)],
        febrile: true,
    },
    DiseaseProfile {
        name: "Chronic Kidney Disease",
        symptoms: &[
            "fatigue",
            "swelling in ankles",
            "decreased urine output",
            "nausea",
            "loss of appetite",
            "muscle cramps",
            "itching",
        ],
        root_cause: "Progressive nephron damage from diabetes, hypertension, or glomerulonephritis impairing filtration",
        severity_weights: [0.25, 0.45, 0.3],
        treatments: &[
            "ACE inhibitors",
            "dietary protein restriction",
            "dialysis",
            "erythropoietin",
            "phosphate binders",
        ],
        vital_markers: &[],
        lab_markers: &[
            ("creatinine", 2.0, 8.0),
            ("urea", 60.0, 200.0),
            ("potassium", 5.5, 7.0),
        ],
        febrile: false,
    },
    DiseaseProfile {
        name: "Hypothyroidism",
        symptoms: &[
            "fatigue",
            "weight gain",
            "cold intolerance",
            "constipation",
            "dry skin",
            "hair loss",
            "depression",
            "muscle weakness",
        ],
        root_cause: "Autoimmune thyroid destruction (Hashimoto's) or iodine deficiency causing insufficient thyroid hormone",
        severity_weights: [0.4, 0.4, 0.2],
        treatments: &[
            "levothyroxine",
            "regular thyroid monitoring",
            "iodine supplementation",
        ],
        vital_markers: &[],
        lab_markers: &[("tsh", 5.0, 50.0), ("t3", 0.3, 0.8), ("t4", 0.2, 0.7)],
        febrile: false,
    },
    DiseaseProfile {
        name: "Hyperthyroidism",
        symptoms: &[
            "weight loss",
            "rapid heartbeat",
            "anxiety",
            "tremors",
            "heat intolerance",
            "sweating",
            "insomnia",
            "diarrhea",
        ],
        root_cause: "Excess thyroid hormone production from Graves' disease or toxic nodular goiter",
        severity_weights: [0.3, 0.45, 0.25],
        treatments: &[
            "antithyroid drugs",
            "radioactive iodine",
            "beta-blockers",
            "thyroidectomy",
        ],
        vital_markers: &[],
        lab_markers: &[("tsh", 0.01, 0.3), ("t3", 2.5, 6.0), ("t4", 1.8, 4.5)],
        febrile: false,
    },
    DiseaseProfile {
        name: "Anemia",
        symptoms: &[
            "fatigue",
            "pale skin",
            "weakness",
            "dizziness",
            "shortness of breath",
            "cold hands",
            "headache",
            "chest pain",
        ],
        root_cause: "Insufficient hemoglobin from iron deficiency, B12 deficiency, chronic disease, or bone marrow dysfunction",
        severity_weights: [0.35, 0.4, 0.25],
        treatments: &[
            "iron supplements",
            "vitamin B12 injections",
            "folic acid",
            "dietary changes",
            "blood transfusion",
        ],
        vital_markers: &[],
        lab_markers: &[
            ("hemoglobin", 5.0, 10.5),
            ("rbc_count", 2.5, 3.8),
            ("iron", 20.0, 50.0),
        ],
        febrile: false,
    },
    DiseaseProfile {
        name: "Asthma",
        symptoms: &[
            "wheezing",
            "shortness of breath",
            "chest tightness",
            "cough",
            "difficulty breathing at night",
            "exercise intolerance",
        ],
        root_cause: "Chronic airway inflammation with bronchial hyperresponsiveness triggered by allergens or irritants",
        severity_weights: [0.4, 0.35, 0.25],
        treatments: &[
            "inhaled corticosteroids",
            "bronchodilators",
            "leukotriene modifiers",
            "allergen avoidance",
            "immunotherapy",
        ],
        vital_markers: &[],
        lab_markers: &[],
        febrile: false,
    },
    DiseaseProfile {
        name: "Liver Disease (NAFLD)",
        symptoms: &[
            "fatigue",
            "abdominal pain",
            "jaundice",
            "swelling in legs",
            "nausea",
            "dark urine",
            "loss of appetite",
        ],
        root_cause: "Fat accumulation in hepatocytes from metabolic syndrome, obesity, or alcohol causing hepatic inflammation",
        severity_weights: [0.3, 0.4, 0.3],
        treatments: &[
            "weight loss",
            "dietary changes",
            "avoid alcohol",
            "vitamin E",
            "ursodeoxycholic acid",
        ],
        vital_markers: &[],
        lab_markers: &[
            ("sgot", 60.0, 300.0),
            ("sgpt", 65.0, 400.0),
            ("bilirubin_total", 2.0, 8.0),
            ("alkaline_phosphatase", 130.0, 400.0),
            ("albumin", 2.0, 3.2),
        ],
        febrile: false,
    },
    DiseaseProfile {
        name: "Dengue Fever",
        symptoms: &[
            "high fever",
            "severe headache",
            "pain behind eyes",
            "joint pain",
            "muscle pain",
            "rash",
            "nausea",
            "vomiting",
            "fatigue",
        ],
        root_cause: "Infection by Dengue virus transmitted through Aedes aegypti mosquito bite causing systemic inflammation",
        severity_weights: [0.35, 0.4, 0.25],
        treatments: &[
            "fluid replacement",
            "paracetamol",
            "platelet monitoring",
            "rest",
            "hospitalization if severe",
        ],
        vital_markers: &[],
        lab_markers: &[
            ("platelet_count", 20000.0, 90000.0),
            ("wbc_count", 2000.0, 4000.0),
        ],
        febrile: true,
    },
    DiseaseProfile {
        name: "Tuberculosis",
        symptoms: &[
            "persistent cough",
            "coughing blood",
            "night sweats",
            "weight loss",
            "fever",
            "fatigue",
            "chest pain",
        ],
        root_cause: "Mycobacterium tuberculosis infection causing granulomatous inflammation primarily in lungs",
        severity_weights: [0.2, 0.45, 0.35],
        treatments: &[
            "DOTS therapy",
            "isoniazid",
            "rifampicin",
            "pyrazinamide",
            "ethambutol",
        ],
        vital_markers: &[],
        lab_markers: &[("hemoglobin", 8.0, 11.0)],
        febrile: true,
    },
    DiseaseProfile {
        name: "Malaria",
        symptoms: &[
            "high fever with chills",
            "sweating",
            "headache",
            "nausea",
            "vomiting",
            "muscle pain",
            "fatigue",
            "jaundice",
        ],
        root_cause: "Plasmodium parasite infection via Anopheles mosquito destroying red blood cells cyclically",
        severity_weights: [0.3, 0.4, 0.3],
        treatments: &[
            "chloroquine",
            "artemisinin combination therapy",
            "primaquine",
            "supportive care",
        ],
        vital_markers: &[],
        lab_markers: &[
            ("hemoglobin", 7.0, 10.0),
            ("platelet_count", 50000.0, 120_000.0),
            ("bilirubin_total", 1.5, 5.0),
        ],
        febrile: true,
    },
    DiseaseProfile {
        name: "Migraine",
        symptoms: &[
            "severe headache",
            "nausea",
            "vomiting",
            "light sensitivity",
            "sound sensitivity",
            "visual aura",
            "throbbing pain",
        ],
        root_cause: "Neurovascular disorder with cortical spreading depression and trigeminal nerve activation",
        severity_weights: [0.3, 0.45, 0.25],
        treatments: &[
            "triptans",
            "NSAIDs",
            "preventive beta-blockers",
            "anticonvulsants",
            "stress management",
            "adequate sleep",
        ],
        vital_markers: &[],
        lab_markers: &[],
        febrile: false,
    },
    DiseaseProfile {
        name: "COPD",
        symptoms: &[
            "chronic cough",
            "shortness of breath",
            "wheezing",
            "chest tightness",
            "frequent respiratory infections",
            "fatigue",
            "blue lips",
        ],
        root_cause: "Irreversible airflow obstruction from chronic bronchitis and emphysema, primarily caused by smoking",
        severity_weights: [0.2, 0.4, 0.4],
        treatments: &[
            "bronchodilators",
            "inhaled steroids",
            "pulmonary rehabilitation",
            "oxygen therapy",
            "smoking cessation",
        ],
        vital_markers: &[],
        lab_markers: &[],
        febrile: false,
    },
    DiseaseProfile {
        name: "Urinary Tract Infection",
        symptoms: &[
            "burning urination",
            "frequent urination",
            "cloudy urine",
            "pelvic pain",
            "strong urine odor",
            "blood in urine",
            "fever",
        ],
        root_cause: "Bacterial colonization of urinary tract, commonly E. coli ascending from perineum",
        severity_weights: [0.5, 0.35, 0.15],
        treatments: &[
            "antibiotics",
            "increased fluid intake",
            "cranberry supplements",
            "urinary analgesics",
        ],
        vital_markers: &[],
        lab_markers: &[("wbc_count", 11000.0, 18000.0)],
        febrile: false,
    },
    DiseaseProfile {
        name: "Gastroesophageal Reflux Disease",
        symptoms: &[
            "heartburn",
            "acid regurgitation",
            "chest pain",
            "difficulty swallowing",
            "chronic cough",
            "sore throat",
            "bloating",
        ],
        root_cause: "Lower esophageal sphincter dysfunction allowing gastric acid reflux causing esophageal mucosal damage",
        severity_weights: [0.4, 0.4, 0.2],
        treatments: &[
            "proton pump inhibitors",
            "H2 blockers",
            "antacids",
            "dietary modifications",
            "weight loss",
            "elevate head during sleep",
        ],
        vital_markers: &[],
        lab_markers: &[],
        febrile: false,
    },
    DiseaseProfile {
        name: "Rheumatoid Arthritis",
        symptoms: &[
            "joint pain",
            "joint swelling",
            "morning stiffness",
            "fatigue",
            "fever",
            "loss of appetite",
            "joint deformity",
        ],
        root_cause: "Autoimmune synovial inflammation causing progressive joint cartilage and bone erosion",
        severity_weights: [0.3, 0.4, 0.3],
        treatments: &[
            "DMARDs",
            "methotrexate",
            "biologics",
            "NSAIDs",
            "corticosteroids",
            "physical therapy",
        ],
        vital_markers: &[],
        lab_markers: &[],
        febrile: false,
    },
    DiseaseProfile {
        name: "Vitamin D Deficiency",
        symptoms: &[
            "bone pain",
            "muscle weakness",
            "fatigue",
            "depression",
            "frequent infections",
            "slow wound healing",
            "hair loss",
        ],
        root_cause: "Insufficient vitamin D from limited sun exposure, dietary deficiency, or malabsorption",
        severity_weights: [0.45, 0.4, 0.15],
        treatments: &[
            "vitamin D3 supplements",
            "sun exposure",
            "calcium supplements",
            "dietary changes",
        ],
        vital_markers: &[],
        lab_markers: &[("vitamin_d", 5.0, 19.0), ("calcium", 7.5, 8.5)],
        febrile: false,
    },
    DiseaseProfile {
        name: "Depression",
        symptoms: &[
            "persistent sadness",
            "loss of interest",
            "fatigue",
            "sleep disturbance",
            "appetite changes",
            "difficulty concentrating",
            "feelings of worthlessness",
            "social withdrawal",
        ],
        root_cause: "Neurochemical imbalance (serotonin, norepinephrine) combined with psychosocial stressors and genetic vulnerability",
        severity_weights: [0.3, 0.4, 0.3],
        treatments: &[
            "SSRIs",
            "cognitive behavioral therapy",
            "counseling",
            "exercise",
            "mindfulness",
            "social support",
        ],
        vital_markers: &[],
        lab_markers: &[
            ("tsh", 0.5, 4.5),
            ("vitamin_d", 10.0, 25.0),
            ("vitamin_b12", 150.0, 300.0),
        ],
        febrile: false,
    },
];

/// Disease names in profile order.
#[must_use]
pub fn disease_names() -> Vec<&'static str> {
    DISEASE_PROFILES.iter().map(|p| p.name).collect()
}

/// Every profile symptom, deduplicated, in first-seen order.
#[must_use]
pub fn all_symptoms() -> Vec<&'static str> {
    let mut seen = Vec::new();
    for symptom in DISEASE_PROFILES.iter().flat_map(|p| p.symptoms.iter()) {
        if !seen.contains(symptom) {
            seen.push(*symptom);
        }
    }
    seen
}
