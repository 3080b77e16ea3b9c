//! ONNX Runtime backend for the leaf classifier.

use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::TensorRef;

use super::preprocess::PreparedImage;
use super::service::ImageClassifier;
use super::ClassifierError;

/// MobileNetV2 classifier exported to ONNX (NHWC float input, softmax output).
///
/// `Session::run` needs `&mut self`, hence the Mutex behind the `&self` trait.
pub struct OnnxClassifier {
    session: Mutex<Session>,
}

impl OnnxClassifier {
    pub fn load(model_path: &Path) -> Result<Self, ClassifierError> {
        if !model_path.exists() {
            return Err(ClassifierError::ModelNotFound(model_path.to_path_buf()));
        }

        let session = Session::builder()
            .map_err(|e: ort::Error| ClassifierError::ModelInit(e.to_string()))?
            .with_intra_threads(2)
            .map_err(|e: ort::Error| ClassifierError::ModelInit(e.to_string()))?
            .commit_from_file(model_path)
            .map_err(|e: ort::Error| ClassifierError::ModelInit(format!("ONNX load failed: {e}")))?;

        tracing::info!(path = %model_path.display(), "ONNX classifier loaded");

        Ok(Self {
            session: Mutex::new(session),
        })
    }
}

impl ImageClassifier for OnnxClassifier {
    fn infer(&self, input: &PreparedImage) -> Result<Vec<f32>, ClassifierError> {
        let array = ndarray::Array4::from_shape_vec(input.shape(), input.data.clone())
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;
        let tensor = TensorRef::from_array_view(&array)
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| ClassifierError::Inference("Session lock poisoned".to_string()))?;

        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| ClassifierError::Inference(format!("ONNX inference failed: {e}")))?;

        // Output shape: [1, num_classes]
        let (shape, scores) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::Inference(format!("Output extraction: {e}")))?;

        if shape.len() != 2 || shape[0] != 1 {
            return Err(ClassifierError::Inference(format!(
                "Unexpected output shape: {shape:?}, expected [1, classes]"
            )));
        }

        Ok(scores.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_model_file_is_reported() {
        let result = OnnxClassifier::load(Path::new("/nonexistent/model.onnx"));
        assert!(matches!(result, Err(ClassifierError::ModelNotFound(_))));
    }
}
