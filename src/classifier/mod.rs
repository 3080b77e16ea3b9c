//! Leaf disease classification: preprocessing, model inference, label mapping.

pub mod labels;
#[cfg(feature = "onnx-classifier")]
pub mod onnx;
pub mod prediction;
pub mod preprocess;
pub mod service;

use std::path::PathBuf;

pub use labels::{parse_class_name, ParsedLabel};
pub use prediction::Prediction;
pub use service::{ClassifierService, ImageClassifier, MockClassifier};

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("Model not loaded")]
    ModelNotLoaded,

    #[error("Model file not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("Model initialization failed: {0}")]
    ModelInit(String),

    #[error("Image decode failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Image encode failed: {0}")]
    Encode(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Invalid class names file: {0}")]
    ClassNames(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
