//! `GET /report`: PDF diagnosis report for the session's prediction.

use std::path::Path;

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Extension;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, SessionId};
use crate::report::{generate_report, report_filename, ReportRequest};

use super::result::UPLOAD_PAGE;

pub async fn download(
    State(ctx): State<ApiContext>,
    Extension(SessionId(session_id)): Extension<SessionId>,
) -> Result<Response, ApiError> {
    let session = ctx.core.sessions.get(session_id)?;
    let Some((prediction, image_path)) =
        session.and_then(|s| s.prediction.map(|p| (p, s.image_path)))
    else {
        return Ok(Redirect::to(UPLOAD_PAGE).into_response());
    };

    let mut request = ReportRequest::new(
        &prediction.plant_type,
        &prediction.condition,
        prediction.confidence,
    );
    if let Some(relative) = image_path {
        request = request.with_image(ctx.core.config.resolve_static(Path::new(&relative)));
    }

    let core = ctx.core.clone();
    let render_request = request.clone();
    let pdf =
        tokio::task::spawn_blocking(move || generate_report(&core.knowledge, &render_request))
            .await??;

    tracing::info!(
        session = %session_id,
        plant = %request.plant,
        condition = %request.condition,
        bytes = pdf.len(),
        "Report generated"
    );

    let disposition = format!(
        "attachment; filename=\"{}\"",
        report_filename(&request.plant, &request.condition)
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use axum::http::{header, StatusCode};

    use crate::api::endpoints::test_support::*;

    #[tokio::test]
    async fn without_prediction_redirects_to_upload() {
        let harness = Harness::new();
        let response = harness.send(get("/report")).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/upload");
    }

    #[tokio::test]
    async fn known_condition_downloads_pdf() {
        let harness = Harness::new();
        let cookie = harness.predicted_session().await;

        let response = harness.send(with_cookie(get("/report"), &cookie)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"PlantCare_Report_Strawberry_Leaf_scorch.pdf\""
        );
        let pdf = body_bytes(response).await;
        assert!(pdf.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn unknown_condition_is_404_without_pdf() {
        let harness = Harness::predicting("Tomato___Late_blight");
        let cookie = harness.predicted_session().await;

        let response = harness.send(with_cookie(get("/report"), &cookie)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "REPORT_UNAVAILABLE");
        assert_eq!(
            json["error"]["message"],
            "Detailed report currently unavailable for this condition: Late blight. \
             Please check back later."
        );
    }
}
