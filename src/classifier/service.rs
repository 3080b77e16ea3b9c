use std::path::Path;

use super::labels::load_class_names;
use super::prediction::{argmax, Prediction, UNKNOWN_CLASS};
use super::preprocess::{prepare_decoded, PreparedImage};
use super::ClassifierError;
use crate::config::AppConfig;

/// Model runtime abstraction (allows mocking).
///
/// Returns one probability per class for a single prepared image.
pub trait ImageClassifier: Send + Sync {
    fn infer(&self, input: &PreparedImage) -> Result<Vec<f32>, ClassifierError>;
}

/// Leaf classifier service: optional model + label list + input size.
///
/// Built once at start-up and shared read-only. When no model could be
/// loaded, every prediction fails with `ModelNotLoaded`.
pub struct ClassifierService {
    model: Option<Box<dyn ImageClassifier>>,
    class_names: Vec<String>,
    input_size: u32,
}

impl ClassifierService {
    pub fn new(
        model: Option<Box<dyn ImageClassifier>>,
        class_names: Vec<String>,
        input_size: u32,
    ) -> Self {
        Self {
            model,
            class_names,
            input_size,
        }
    }

    /// Load the model and label list named in the configuration.
    ///
    /// A model that fails to load is logged and left absent; the service
    /// still starts so the rest of the application stays reachable.
    pub fn load(config: &AppConfig) -> Self {
        let class_names = load_class_names(&config.class_names_path);
        let model = match load_model(&config.model_path) {
            Ok(model) => Some(model),
            Err(e) => {
                tracing::error!(error = %e, "Classifier model unavailable");
                None
            }
        };
        Self::new(model, class_names, crate::config::IMG_SIZE)
    }

    pub fn is_model_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }

    pub fn input_size(&self) -> u32 {
        self.input_size
    }

    /// Classify raw upload bytes.
    pub fn predict_bytes(&self, bytes: &[u8]) -> Result<Prediction, ClassifierError> {
        // Checked before decoding so a missing model is reported as such
        // rather than as a decode failure.
        if self.model.is_none() {
            return Err(ClassifierError::ModelNotLoaded);
        }
        let img = super::preprocess::decode_image(bytes)?;
        self.predict_image(&img)
    }

    /// Classify an already-decoded image.
    pub fn predict_image(&self, img: &image::DynamicImage) -> Result<Prediction, ClassifierError> {
        let model = self.model.as_ref().ok_or(ClassifierError::ModelNotLoaded)?;
        let input = prepare_decoded(img, self.input_size);

        let scores = model.infer(&input)?;
        let (idx, probability) = argmax(&scores)
            .ok_or_else(|| ClassifierError::Inference("model returned no scores".into()))?;

        let raw_class = self
            .class_names
            .get(idx)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_CLASS);

        let prediction = Prediction::from_label(raw_class, probability);
        tracing::info!(
            class = %prediction.raw_class,
            confidence = prediction.confidence,
            "Leaf classified"
        );
        Ok(prediction)
    }
}

#[cfg(feature = "onnx-classifier")]
fn load_model(path: &Path) -> Result<Box<dyn ImageClassifier>, ClassifierError> {
    let model = super::onnx::OnnxClassifier::load(path)?;
    Ok(Box::new(model))
}

#[cfg(not(feature = "onnx-classifier"))]
fn load_model(path: &Path) -> Result<Box<dyn ImageClassifier>, ClassifierError> {
    Err(ClassifierError::ModelInit(format!(
        "built without the onnx-classifier feature; cannot load {}",
        path.display()
    )))
}

/// Mock classifier for testing. Returns a configurable score vector.
pub struct MockClassifier {
    scores: Vec<f32>,
}

impl MockClassifier {
    pub fn new(scores: Vec<f32>) -> Self {
        Self { scores }
    }

    /// Scores that put `probability` on `index` out of `classes`.
    pub fn peaked(classes: usize, index: usize, probability: f32) -> Self {
        let rest = if classes > 1 {
            (1.0 - probability) / (classes - 1) as f32
        } else {
            0.0
        };
        let mut scores = vec![rest; classes];
        if let Some(slot) = scores.get_mut(index) {
            *slot = probability;
        }
        Self::new(scores)
    }
}

impl ImageClassifier for MockClassifier {
    fn infer(&self, _input: &PreparedImage) -> Result<Vec<f32>, ClassifierError> {
        Ok(self.scores.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::labels::default_class_names;
    use crate::classifier::preprocess::sample_png;

    fn service_with(scores: MockClassifier) -> ClassifierService {
        ClassifierService::new(Some(Box::new(scores)), default_class_names(), 32)
    }

    #[test]
    fn predicts_top_class() {
        let names = default_class_names();
        let idx = names.iter().position(|n| n == "Strawberry___Leaf_scorch").unwrap();
        let service = service_with(MockClassifier::peaked(names.len(), idx, 0.9777));

        let prediction = service.predict_bytes(&sample_png(16, 16, [40, 120, 40])).unwrap();
        assert_eq!(prediction.raw_class, "Strawberry___Leaf_scorch");
        assert_eq!(prediction.plant_type, "Strawberry");
        assert_eq!(prediction.condition, "Leaf scorch");
        assert_eq!(prediction.confidence, 97.77);
        assert!(!prediction.is_healthy);
    }

    #[test]
    fn out_of_range_index_reports_unknown() {
        let service = ClassifierService::new(
            Some(Box::new(MockClassifier::new(vec![0.1, 0.2, 0.7]))),
            vec!["Apple___healthy".into()],
            32,
        );
        let prediction = service.predict_bytes(&sample_png(8, 8, [0, 0, 0])).unwrap();
        assert_eq!(prediction.raw_class, "Unknown");
        assert_eq!(prediction.condition, "Unknown");
    }

    #[test]
    fn missing_model_is_explicit_error() {
        let service = ClassifierService::new(None, default_class_names(), 32);
        assert!(!service.is_model_loaded());
        let err = service.predict_bytes(&sample_png(8, 8, [0, 0, 0])).unwrap_err();
        assert!(matches!(err, ClassifierError::ModelNotLoaded));
    }

    #[test]
    fn decode_failure_propagates() {
        let service = service_with(MockClassifier::peaked(38, 0, 0.9));
        let err = service.predict_bytes(b"not an image").unwrap_err();
        assert!(matches!(err, ClassifierError::Decode(_)));
    }

    #[test]
    fn empty_scores_are_inference_error() {
        let service = service_with(MockClassifier::new(vec![]));
        let err = service.predict_bytes(&sample_png(8, 8, [0, 0, 0])).unwrap_err();
        assert!(matches!(err, ClassifierError::Inference(_)));
    }

    #[test]
    fn load_without_model_file_starts_unloaded() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::with_base_dir(dir.path());
        let service = ClassifierService::load(&config);
        assert!(!service.is_model_loaded());
        assert_eq!(service.class_names().len(), 38);
        assert_eq!(service.input_size(), 224);
    }

    #[test]
    fn peaked_mock_distributes_remainder() {
        let mock = MockClassifier::peaked(4, 2, 0.7);
        let total: f32 = mock.scores.iter().sum();
        assert!((total - 1.0).abs() < 1e-5);
        assert_eq!(argmax(&mock.scores), Some((2, 0.7)));
    }
}
