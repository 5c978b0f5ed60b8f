//! Medical image analysis types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Largest accepted image upload.
pub const MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

/// Accepted MIME types for image uploads.
pub const ALLOWED_IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/dicom", "image/webp"];

/// Accepted file extensions when the MIME type is missing or unrecognized.
pub const ALLOWED_IMAGE_EXTENSIONS: [&str; 5] = [".jpg", ".jpeg", ".png", ".webp", ".dcm"];

/// Imaging modality.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ImageType {
    #[default]
    Xray,
    Mri,
    Ct,
    Other,
}

impl ImageType {
    /// Human-readable label used in prompts.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Xray => "chest X-ray",
            Self::Mri => "MRI scan",
            Self::Ct => "CT scan",
            Self::Other => "medical image",
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Xray => "xray",
            Self::Mri => "mri",
            Self::Ct => "ct",
            Self::Other => "other",
        }
    }
}

impl From<&str> for ImageType {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "xray" | "x-ray" => Self::Xray,
            "mri" => Self::Mri,
            "ct" => Self::Ct,
            _ => Self::Other,
        }
    }
}

impl From<String> for ImageType {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

/// Structured findings for one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAnalysis {
    pub image_type: String,
    pub findings: String,
    /// 0 to 100.
    pub confidence: f64,
    #[serde(default, alias = "abnormalities")]
    pub abnormalities_detected: Vec<String>,
    pub recommendation: String,
}

impl ImageAnalysis {
    /// Generic response when no automated interpretation is available.
    #[must_use]
    pub fn specialist_review(image_type: ImageType) -> Self {
        Self {
            image_type: image_type.label().to_string(),
            findings: "Unable to perform automated analysis. Image received successfully."
                .to_string(),
            confidence: 0.0,
            abnormalities_detected: vec!["Requires specialist review".to_string()],
            recommendation:
                "Please have a qualified radiologist review this image for accurate medical interpretation."
                    .to_string(),
        }
    }
}

/// Append-only history entry for image analyses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageAnalysisEntry {
    pub id: String,
    pub filename: String,
    pub image_type: ImageType,
    pub result: ImageAnalysis,
    pub created_at: DateTime<Utc>,
}

impl ImageAnalysisEntry {
    #[must_use]
    pub fn new(filename: impl Into<String>, image_type: ImageType, result: ImageAnalysis) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            filename: filename.into(),
            image_type,
            result,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_type_parsing() {
        assert_eq!(ImageType::from("XRAY"), ImageType::Xray);
        assert_eq!(ImageType::from("ct"), ImageType::Ct);
        assert_eq!(ImageType::from("ultrasound"), ImageType::Other);
        assert_eq!(ImageType::Mri.label(), "MRI scan");
    }

    #[test]
    fn test_specialist_review() {
        let analysis = ImageAnalysis::specialist_review(ImageType::Ct);
        assert_eq!(analysis.image_type, "CT scan");
        assert!(analysis.confidence.abs() < f64::EPSILON);
        assert!(!analysis.recommendation.is_empty());
    }
}
