use crate::catalog::Category;
use crate::classifier::{Classification, Detection, Summary};
use serde::{Deserialize, Serialize};

pub const CLASSIFICATION_SUCCESSFUL: &str = "Classification successful.";
pub const NO_WASTE_DETECTED: &str = "No waste item detected";

/// A base 64 image sent as JSON or as a url-encoded form. The field may also
/// hold a `data:` URL.
#[derive(Debug, Default, Deserialize)]
pub struct B64Image {
    pub image_base64: Option<String>,
}

/// Disposal details of one reported material
#[derive(Debug, Serialize)]
pub struct MaterialClassification<'a> {
    pub category: Category,
    pub bin_color: &'a str,
    pub color: &'a str,
    pub instructions: &'a str,
}

#[derive(Debug, Serialize)]
pub struct MaterialReport<'a> {
    pub id: &'a str,
    pub detected_material: &'a str,
    pub confidence: f64,
    pub classification: MaterialClassification<'a>,
}

impl<'a> From<&Detection<'a>> for MaterialReport<'a> {
    fn from(detection: &Detection<'a>) -> Self {
        let entry = detection.entry;
        MaterialReport {
            id: &entry.id,
            detected_material: &entry.display_name,
            confidence: detection.confidence,
            classification: MaterialClassification {
                category: entry.category,
                bin_color: &entry.bin_color,
                color: &entry.color,
                instructions: &entry.instructions,
            },
        }
    }
}

/// The body of every `/classify_waste` response, errors included
#[derive(Debug, Serialize)]
pub struct ClassificationResult<'a> {
    pub success: bool,
    pub message: String,
    pub total_materials_detected: usize,
    pub summary: Summary,
    pub materials: Vec<MaterialReport<'a>>,
}

impl ClassificationResult<'static> {
    /// An empty, unsuccessful result
    pub fn failure(message: impl Into<String>) -> Self {
        ClassificationResult {
            success: false,
            message: message.into(),
            total_materials_detected: 0,
            summary: Summary::default(),
            materials: vec![],
        }
    }
}

impl<'a> From<Classification<'a>> for ClassificationResult<'a> {
    fn from(classification: Classification<'a>) -> Self {
        match classification {
            Classification::Detected {
                detections,
                summary,
            } => ClassificationResult {
                success: true,
                message: CLASSIFICATION_SUCCESSFUL.into(),
                total_materials_detected: detections.len(),
                summary,
                materials: detections.iter().map(MaterialReport::from).collect(),
            },
            Classification::Suppressed { .. } => ClassificationResult::failure(NO_WASTE_DETECTED),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub success: bool,
    pub message: &'static str,
}

impl Health {
    pub fn ok() -> Self {
        Health {
            success: true,
            message: "OK",
        }
    }
}
