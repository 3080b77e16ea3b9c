use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::types::ApiContext;
use crate::config::APP_VERSION;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_loaded: bool,
    pub classes: usize,
    pub version: &'static str,
    pub uptime_secs: u64,
}

/// `GET /health`: liveness plus model status. Does not create a session.
pub async fn check(State(ctx): State<ApiContext>) -> Json<HealthResponse> {
    let classifier = &ctx.core.classifier;
    Json(HealthResponse {
        status: "ok",
        model_loaded: classifier.is_model_loaded(),
        classes: classifier.class_names().len(),
        version: APP_VERSION,
        uptime_secs: ctx.core.uptime_secs(),
    })
}
