//! Medical image analysis with a specialist-review fallback.

use std::sync::Arc;

use crate::domain::{
    ImageAnalysis, ImageAnalysisEntry, ImageType, ALLOWED_IMAGE_EXTENSIONS, ALLOWED_IMAGE_TYPES,
    MAX_IMAGE_BYTES,
};
use crate::ports::{ImageInterpreter, Storage};
use crate::DxError;

/// MIME type of an accepted upload, from its declared content type or,
/// failing that, its file extension.
#[must_use]
pub fn accepted_mime(filename: &str, content_type: Option<&str>) -> Option<&'static str> {
    if let Some(declared) = content_type {
        let declared = declared.trim().to_ascii_lowercase();
        if let Some(mime) = ALLOWED_IMAGE_TYPES.iter().copied().find(|t| *t == declared) {
            return Some(mime);
        }
    }

    let lower = filename.to_ascii_lowercase();
    let ext = ALLOWED_IMAGE_EXTENSIONS
        .iter()
        .find(|ext| lower.ends_with(*ext))?;
    Some(match *ext {
        ".png" => "image/png",
        ".webp" => "image/webp",
        ".dcm" => "image/dicom",
        _ => "image/jpeg",
    })
}

pub struct ImagingService<S>
where
    S: Storage,
{
    storage: Arc<S>,
    interpreter: Arc<dyn ImageInterpreter>,
}

impl<S> ImagingService<S>
where
    S: Storage,
    S::Error: Into<crate::adapters::StorageError>,
{
    pub fn new(storage: Arc<S>, interpreter: Arc<dyn ImageInterpreter>) -> Self {
        Self {
            storage,
            interpreter,
        }
    }

    /// Interpret one uploaded image and record the result.
    ///
    /// # Errors
    /// `Validation` for an unsupported type or an oversized image.
    pub fn analyze(
        &self,
        filename: &str,
        content_type: Option<&str>,
        image_type: ImageType,
        bytes: &[u8],
    ) -> crate::Result<ImageAnalysis> {
        let mime = accepted_mime(filename, content_type)
            .ok_or_else(|| DxError::Validation("Unsupported image type".into()))?;
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(DxError::Validation("Image too large. Max 20MB.".into()));
        }

        let analysis = match self.interpreter.interpret(bytes, mime, image_type) {
            Ok(analysis) => analysis,
            Err(e) => {
                tracing::warn!("Image analysis unavailable: {}; returning specialist review", e);
                ImageAnalysis::specialist_review(image_type)
            }
        };

        let entry = ImageAnalysisEntry::new(filename, image_type, analysis.clone());
        if let Err(e) = self.storage.append_image_analysis(&entry) {
            tracing::warn!("Failed to save image analysis: {:?}", e);
        }

        Ok(analysis)
    }
}
