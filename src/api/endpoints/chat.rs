//! `POST /chat`: streamed follow-up conversation over Server-Sent Events.
//!
//! Each relayed chunk becomes one `data:` event; failures become
//! `data: [ERROR] …` and every stream ends with `data: [DONE]`.

use std::convert::Infallible;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderName};
use axum::response::sse::{Event, Sse};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use futures_util::stream::{self, Stream};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, SessionId};
use crate::chat::prompt::chat_messages;
use crate::chat::{spawn_relay, validate_history, ChatMessage, CompletionRequest, StreamEvent};
use crate::core_state::CoreState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

pub async fn converse(
    State(ctx): State<ApiContext>,
    Extension(SessionId(session_id)): Extension<SessionId>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let prediction = ctx
        .core
        .sessions
        .get(session_id)?
        .and_then(|s| s.prediction)
        .ok_or(ApiError::NoPrediction)?;

    let Json(body) = body.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    if body.messages.is_empty() {
        return Err(ApiError::BadRequest("No messages provided".into()));
    }
    validate_history(&body.messages).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let request = CompletionRequest {
        messages: chat_messages(&prediction, &body.messages),
        max_tokens: ctx.core.config.llm.chat_max_tokens,
    };
    ctx.core.sessions.set_history(session_id, body.messages)?;

    tracing::debug!(session = %session_id, model = ctx.core.chat.model(), "Chat stream opened");
    let rx = spawn_relay(ctx.core.chat.clone(), request);
    let events = sse_events(rx, ctx.core.clone(), session_id);

    Ok((
        [
            (header::CACHE_CONTROL, "no-cache"),
            (HeaderName::from_static("x-accel-buffering"), "no"),
        ],
        Sse::new(events),
    ))
}

/// Map relay events to SSE frames, recording the reply once it finished
/// cleanly. A failed stream leaves only the user's turns in the history.
fn sse_events(
    rx: tokio::sync::mpsc::Receiver<StreamEvent>,
    core: std::sync::Arc<CoreState>,
    session_id: Uuid,
) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold(rx, move |mut rx| {
        let core = core.clone();
        async move {
            let event = rx.recv().await?;
            if let StreamEvent::Done {
                full_text: Some(full_text),
            } = &event
            {
                if let Err(e) = core.sessions.append_assistant(session_id, full_text.clone()) {
                    tracing::warn!(session = %session_id, error = %e, "Failed to record reply");
                }
            }
            Some((Ok(Event::default().data(event.to_sse_data())), rx))
        }
    })
}
