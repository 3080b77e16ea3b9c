//! `POST /predict`: classify an uploaded leaf photo.
//!
//! The upload is decoded once, classified, and re-saved as a JPEG under
//! `static/images/` so the result page and report can show it.

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Serialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, SessionId};
use crate::classifier::preprocess::{decode_image, encode_jpeg};
use crate::classifier::{ClassifierError, Prediction};
use crate::core_state::CoreState;

const UPLOAD_FIELD: &str = "file";
const JPEG_QUALITY: u8 = 90;

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub success: bool,
}

pub async fn upload(
    State(ctx): State<ApiContext>,
    Extension(SessionId(session_id)): Extension<SessionId>,
    mut multipart: Multipart,
) -> Result<Json<PredictResponse>, ApiError> {
    let bytes = read_upload(&mut multipart).await?;

    let core = ctx.core.clone();
    let (prediction, image_path) =
        tokio::task::spawn_blocking(move || classify_and_store(&core, &bytes)).await??;

    tracing::info!(
        session = %session_id,
        class = %prediction.raw_class,
        confidence = prediction.confidence,
        "Prediction stored"
    );
    ctx.core
        .sessions
        .set_prediction(session_id, prediction, Some(image_path))?;

    Ok(Json(PredictResponse { success: true }))
}

/// Pull the `file` field out of the form.
async fn read_upload(multipart: &mut Multipart) -> Result<Vec<u8>, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        if field.file_name().map_or(true, |name| name.trim().is_empty()) {
            return Err(ApiError::BadRequest("No file selected".into()));
        }
        let bytes = field.bytes().await.map_err(multipart_error)?;
        if bytes.is_empty() {
            return Err(ApiError::BadRequest("Uploaded file is empty".into()));
        }
        return Ok(bytes.to_vec());
    }
    Err(ApiError::BadRequest("No file uploaded".into()))
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge
    } else {
        ApiError::BadRequest(err.body_text())
    }
}

/// Classify, then re-save the decoded image. Returns the prediction and the
/// image path relative to the static root.
fn classify_and_store(core: &CoreState, bytes: &[u8]) -> Result<(Prediction, String), ClassifierError> {
    if !core.classifier.is_model_loaded() {
        return Err(ClassifierError::ModelNotLoaded);
    }
    let img = decode_image(bytes)?;
    let prediction = core.classifier.predict_image(&img)?;

    let jpeg = encode_jpeg(&img, JPEG_QUALITY)?;
    let images_dir = core.config.static_images_dir();
    std::fs::create_dir_all(&images_dir)?;
    let token = Uuid::new_v4().simple().to_string();
    let file_name = format!("upload_{}.jpg", &token[..16]);
    std::fs::write(images_dir.join(&file_name), jpeg)?;

    Ok((prediction, format!("images/{file_name}")))
}
