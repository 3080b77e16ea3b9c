//! Class label list and compound label parsing.
//!
//! Labels follow the PlantVillage convention `Plant___Condition`, where
//! underscores stand in for spaces (`Corn_(maize)___Common_rust_`).

use std::path::Path;

use serde::Serialize;

use super::ClassifierError;

/// Separator between plant and condition in a raw label.
pub const LABEL_SEPARATOR: &str = "___";

/// Condition reported when a label carries no condition part.
pub const UNKNOWN_CONDITION: &str = "Unknown";

/// The 38 PlantVillage classes in model output order.
pub const PLANT_VILLAGE_CLASSES: [&str; 38] = [
    "Apple___Apple_scab",
    "Apple___Black_rot",
    "Apple___Cedar_apple_rust",
    "Apple___healthy",
    "Blueberry___healthy",
    "Cherry_(including_sour)___Powdery_mildew",
    "Cherry_(including_sour)___healthy",
    "Corn_(maize)___Cercospora_leaf_spot Gray_leaf_spot",
    "Corn_(maize)___Common_rust_",
    "Corn_(maize)___Northern_Leaf_Blight",
    "Corn_(maize)___healthy",
    "Grape___Black_rot",
    "Grape___Esca_(Black_Measles)",
    "Grape___Leaf_blight_(Isariopsis_Leaf_Spot)",
    "Grape___healthy",
    "Orange___Haunglongbing_(Citrus_greening)",
    "Peach___Bacterial_spot",
    "Peach___healthy",
    "Pepper,_bell___Bacterial_spot",
    "Pepper,_bell___healthy",
    "Potato___Early_blight",
    "Potato___Late_blight",
    "Potato___healthy",
    "Raspberry___healthy",
    "Soybean___healthy",
    "Squash___Powdery_mildew",
    "Strawberry___Leaf_scorch",
    "Strawberry___healthy",
    "Tomato___Bacterial_spot",
    "Tomato___Early_blight",
    "Tomato___Late_blight",
    "Tomato___Leaf_Mold",
    "Tomato___Septoria_leaf_spot",
    "Tomato___Spider_mites Two-spotted_spider_mite",
    "Tomato___Target_Spot",
    "Tomato___Tomato_Yellow_Leaf_Curl_Virus",
    "Tomato___Tomato_mosaic_virus",
    "Tomato___healthy",
];

/// A raw label split into its human-readable parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedLabel {
    pub plant: String,
    pub condition: String,
    pub is_healthy: bool,
}

/// Split `Plant___Condition` into plant, condition and the healthy flag.
///
/// Underscores become spaces in both parts and commas are dropped from the
/// plant name. A label without a separator yields condition `"Unknown"`;
/// segments past the second are ignored.
pub fn parse_class_name(raw: &str) -> ParsedLabel {
    let mut parts = raw.split(LABEL_SEPARATOR);
    let plant = parts
        .next()
        .unwrap_or_default()
        .replace('_', " ")
        .replace(',', "");
    let condition = parts
        .next()
        .map(|c| c.replace('_', " "))
        .unwrap_or_else(|| UNKNOWN_CONDITION.to_string());
    let is_healthy = condition.to_lowercase().contains("healthy");

    ParsedLabel {
        plant,
        condition,
        is_healthy,
    }
}

/// Built-in label list as owned strings.
pub fn default_class_names() -> Vec<String> {
    PLANT_VILLAGE_CLASSES.iter().map(|s| s.to_string()).collect()
}

/// Read a JSON array of label strings.
pub fn read_class_names(path: &Path) -> Result<Vec<String>, ClassifierError> {
    let raw = std::fs::read_to_string(path)?;
    let names: Vec<String> = serde_json::from_str(&raw)
        .map_err(|e| ClassifierError::ClassNames(format!("{}: {e}", path.display())))?;
    if names.is_empty() {
        return Err(ClassifierError::ClassNames(format!(
            "{}: label list is empty",
            path.display()
        )));
    }
    Ok(names)
}

/// Load the label list, falling back to the built-in PlantVillage classes
/// when the file is missing or unreadable.
pub fn load_class_names(path: &Path) -> Vec<String> {
    match read_class_names(path) {
        Ok(names) => {
            tracing::info!(count = names.len(), path = %path.display(), "Loaded class names");
            names
        }
        Err(e) => {
            tracing::warn!(error = %e, "Falling back to built-in PlantVillage class names");
            default_class_names()
        }
    }
}
