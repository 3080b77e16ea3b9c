//! `GET /result`: the session's latest prediction.

use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Extension, Json};
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, SessionId};
use crate::classifier::Prediction;

/// Where clients are sent when there is nothing to show.
pub const UPLOAD_PAGE: &str = "/upload";

#[derive(Debug, Serialize)]
pub struct ResultResponse {
    pub prediction: Prediction,
    pub image_url: Option<String>,
}

pub async fn show(
    State(ctx): State<ApiContext>,
    Extension(SessionId(session_id)): Extension<SessionId>,
) -> Result<Response, ApiError> {
    let session = ctx.core.sessions.get(session_id)?;
    let Some((prediction, image_path)) =
        session.and_then(|s| s.prediction.map(|p| (p, s.image_path)))
    else {
        return Ok(Redirect::to(UPLOAD_PAGE).into_response());
    };

    Ok(Json(ResultResponse {
        prediction,
        image_url: image_path.map(|p| format!("/static/{p}")),
    })
    .into_response())
}

#[cfg(test)]
mod tests {
    use axum::http::{header, StatusCode};

    use crate::api::endpoints::test_support::*;

    #[tokio::test]
    async fn without_prediction_redirects_to_upload() {
        let harness = Harness::new();
        let response = harness.send(get("/result")).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/upload");
    }

    #[tokio::test]
    async fn returns_prediction_and_image_url() {
        let harness = Harness::new();
        let cookie = harness.predicted_session().await;

        let response = harness.send(with_cookie(get("/result"), &cookie)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["prediction"]["plant_type"], "Strawberry");
        assert_eq!(json["prediction"]["condition"], "Leaf scorch");
        assert_eq!(json["prediction"]["confidence"], 97.77);
        assert_eq!(json["prediction"]["is_healthy"], false);

        let url = json["image_url"].as_str().unwrap();
        assert!(url.starts_with("/static/images/upload_"));
        assert!(url.ends_with(".jpg"));

        let image = harness.send(get(url)).await;
        assert_eq!(image.status(), StatusCode::OK);
        assert_eq!(&body_bytes(image).await[..2], &[0xFF, 0xD8]);
    }
}
