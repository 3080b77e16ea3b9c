//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::chat::ChatError;
use crate::classifier::ClassifierError;
use crate::report::ReportError;
use crate::session::SessionError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Upload exceeds the size limit")]
    PayloadTooLarge,
    #[error("No active prediction in session")]
    NoPrediction,
    #[error("Model not loaded")]
    ModelUnavailable,
    #[error("Prediction failed: {0}")]
    Prediction(String),
    #[error("No report data for condition: {condition}")]
    ReportUnavailable { condition: String },
    #[error("Report generation failed: {0}")]
    ReportFailed(String),
    #[error("AI service error: {0}")]
    AiService(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail.clone()),
            ApiError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                format!(
                    "Upload exceeds the {} MB limit",
                    crate::config::MAX_UPLOAD_BYTES / (1024 * 1024)
                ),
            ),
            ApiError::NoPrediction => (
                StatusCode::BAD_REQUEST,
                "NO_PREDICTION",
                "No active prediction in session".to_string(),
            ),
            ApiError::ModelUnavailable => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "MODEL_UNAVAILABLE",
                "Model not loaded".to_string(),
            ),
            ApiError::Prediction(detail) => {
                tracing::warn!(detail, "Prediction failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "PREDICTION_FAILED", detail.clone())
            }
            ApiError::ReportUnavailable { condition } => (
                StatusCode::NOT_FOUND,
                "REPORT_UNAVAILABLE",
                format!(
                    "Detailed report currently unavailable for this condition: {condition}. \
                     Please check back later."
                ),
            ),
            ApiError::ReportFailed(detail) => {
                tracing::error!(detail, "Report generation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "REPORT_FAILED",
                    format!("Error generating report: {detail}"),
                )
            }
            ApiError::AiService(detail) => {
                tracing::warn!(detail, "AI service error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "AI_SERVICE_ERROR",
                    format!("AI service error: {detail}"),
                )
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

impl From<ClassifierError> for ApiError {
    fn from(err: ClassifierError) -> Self {
        match err {
            ClassifierError::ModelNotLoaded => ApiError::ModelUnavailable,
            other => ApiError::Prediction(other.to_string()),
        }
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::NoData { condition, .. } => ApiError::ReportUnavailable { condition },
            ReportError::Pdf(detail) => ApiError::ReportFailed(detail),
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        ApiError::AiService(err.to_string())
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("blocking task failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn json_of(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), 4096).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn bad_request_returns_400_with_message() {
        let (status, json) = json_of(ApiError::BadRequest("No file uploaded".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
        assert_eq!(json["error"]["message"], "No file uploaded");
    }

    #[tokio::test]
    async fn missing_model_maps_to_model_unavailable() {
        let (status, json) = json_of(ClassifierError::ModelNotLoaded.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"]["code"], "MODEL_UNAVAILABLE");
    }

    #[tokio::test]
    async fn no_data_maps_to_404() {
        let err: ApiError = ReportError::NoData {
            plant: "Tomato".into(),
            condition: "Late blight".into(),
        }
        .into();
        let (status, json) = json_of(err).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            json["error"]["message"],
            "Detailed report currently unavailable for this condition: Late blight. Please check back later."
        );
    }

    #[tokio::test]
    async fn chat_errors_are_prefixed() {
        let err: ApiError = ChatError::EmptyResponse.into();
        let (status, json) = json_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"]["code"], "AI_SERVICE_ERROR");
        assert!(json["error"]["message"]
            .as_str()
            .unwrap()
            .starts_with("AI service error: "));
    }

    #[tokio::test]
    async fn internal_hides_detail() {
        let (_, json) = json_of(ApiError::Internal("disk on fire".into())).await;
        assert_eq!(json["error"]["message"], "An internal error occurred");
    }
}
