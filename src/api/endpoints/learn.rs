//! `POST /learn`: single-shot explanation panel for the current diagnosis.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, SessionId};
use crate::chat::prompt::learn_messages;
use crate::chat::{CompletionRequest, Panel};

#[derive(Debug, Deserialize)]
pub struct LearnRequest {
    #[serde(default = "default_panel")]
    pub panel: String,
}

fn default_panel() -> String {
    Panel::Overview.as_str().to_string()
}

#[derive(Debug, Serialize)]
pub struct LearnResponse {
    pub content: String,
    /// Panel name as the client sent it.
    pub panel: String,
}

pub async fn explain(
    State(ctx): State<ApiContext>,
    Extension(SessionId(session_id)): Extension<SessionId>,
    body: Result<Json<LearnRequest>, JsonRejection>,
) -> Result<Json<LearnResponse>, ApiError> {
    let prediction = ctx
        .core
        .sessions
        .get(session_id)?
        .and_then(|s| s.prediction)
        .ok_or(ApiError::NoPrediction)?;

    let Json(body) = body.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let panel = Panel::parse(Some(&body.panel));

    let request = CompletionRequest {
        messages: learn_messages(panel, &prediction),
        max_tokens: ctx.core.config.llm.learn_max_tokens,
    };
    let content = ctx.core.chat.complete(request).await?;

    tracing::info!(
        session = %session_id,
        panel = panel.as_str(),
        requested = %body.panel,
        chars = content.len(),
        "Panel explanation generated"
    );
    Ok(Json(LearnResponse {
        content,
        panel: body.panel,
    }))
}
