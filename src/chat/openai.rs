//! OpenAI-compatible chat completion client (`/chat/completions`).
//!
//! Works against Groq (the default), OpenAI and local servers speaking the
//! same protocol. Wire types stay private to this module.

use std::collections::VecDeque;

use futures_util::future::BoxFuture;
use futures_util::stream::{self, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::backend::{ChatBackend, CompletionRequest, DeltaStream};
use super::{ChatError, ChatMessage};
use crate::config::LlmConfig;

#[derive(Debug, Clone)]
pub struct OpenAiCompatibleClient {
    client: Client,
    api_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiCompatibleClient {
    pub fn new(config: &LlmConfig) -> Result<Self, ChatError> {
        // Connect timeout only: streamed answers may legitimately take a while.
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| ChatError::HttpClient(format!("failed to build HTTP client: {e}")))?;

        if config.api_key.is_none() {
            tracing::warn!("GROQ_API_KEY not set; AI requests will be sent unauthenticated");
        }

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }

    async fn send(&self, request: &CompletionRequest, stream: bool) -> Result<reqwest::Response, ChatError> {
        let payload = ChatCompletionRequest {
            model: &self.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            stream,
        };

        debug!(
            model = %self.model,
            messages = request.messages.len(),
            max_tokens = request.max_tokens,
            stream,
            "sending completion request"
        );

        let mut req = self.client.post(&self.api_url).json(&payload);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req.send().await.map_err(|e| {
            error!(url = %self.api_url, error = %e, "completion request failed (transport)");
            if e.is_connect() {
                ChatError::Connection(self.api_url.clone())
            } else {
                ChatError::HttpClient(e.to_string())
            }
        })?;

        check_status(response).await
    }
}

impl ChatBackend for OpenAiCompatibleClient {
    fn complete(&self, request: CompletionRequest) -> BoxFuture<'_, Result<String, ChatError>> {
        Box::pin(async move {
            let response = self.send(&request, false).await?;
            let parsed: ChatCompletionResponse = response
                .json()
                .await
                .map_err(|e| ChatError::ResponseParsing(e.to_string()))?;

            parsed
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .filter(|s| !s.trim().is_empty())
                .ok_or(ChatError::EmptyResponse)
        })
    }

    fn stream(&self, request: CompletionRequest) -> BoxFuture<'_, Result<DeltaStream, ChatError>> {
        Box::pin(async move {
            let response = self.send(&request, true).await?;
            Ok(sse_deltas(response.bytes_stream()))
        })
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Turn a raw SSE body into a stream of content deltas.
fn sse_deltas<S, B, E>(body: S) -> DeltaStream
where
    S: futures_util::Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    struct State<S> {
        body: std::pin::Pin<Box<S>>,
        decoder: SseDecoder,
        pending: VecDeque<Result<String, ChatError>>,
        finished: bool,
    }

    let state = State {
        body: Box::pin(body),
        decoder: SseDecoder::default(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut st| async move {
        loop {
            if let Some(item) = st.pending.pop_front() {
                return Some((item, st));
            }
            if st.finished {
                return None;
            }
            let events = match st.body.next().await {
                Some(Ok(chunk)) => st.decoder.push(chunk.as_ref()),
                Some(Err(e)) => vec![SseEvent::Error(e.to_string())],
                None => {
                    let mut tail = st.decoder.finish();
                    tail.push(SseEvent::Done);
                    tail
                }
            };
            for event in events {
                match event {
                    SseEvent::Delta(text) => st.pending.push_back(Ok(text)),
                    SseEvent::Done => {
                        st.finished = true;
                        break;
                    }
                    SseEvent::Error(message) => {
                        st.pending.push_back(Err(ChatError::Stream(message)));
                        st.finished = true;
                        break;
                    }
                }
            }
        }
    })
    .boxed()
}

#[derive(Debug, Clone, PartialEq)]
enum SseEvent {
    Delta(String),
    Done,
    Error(String),
}

/// Line-oriented decoder for `data:` frames of a streamed completion.
///
/// Chunks may split lines (and UTF-8 sequences) anywhere, so bytes are
/// buffered until a newline arrives.
#[derive(Debug, Default)]
struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    fn push(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(bytes);
        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(event) = parse_line(&String::from_utf8_lossy(&line)) {
                events.push(event);
            }
        }
        events
    }

    /// Flush a final unterminated line.
    fn finish(&mut self) -> Vec<SseEvent> {
        let rest = std::mem::take(&mut self.buffer);
        parse_line(&String::from_utf8_lossy(&rest)).into_iter().collect()
    }
}

fn parse_line(line: &str) -> Option<SseEvent> {
    let data = line.trim().strip_prefix("data:")?.trim();
    if data.is_empty() {
        return None;
    }
    if data == "[DONE]" {
        return Some(SseEvent::Done);
    }
    if let Ok(env) = serde_json::from_str::<ErrorEnvelope>(data) {
        return Some(SseEvent::Error(env.error.message));
    }
    match serde_json::from_str::<ChatCompletionChunk>(data) {
        Ok(chunk) => chunk
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.delta.content)
            .filter(|s| !s.is_empty())
            .map(SseEvent::Delta),
        Err(e) => Some(SseEvent::Error(format!("malformed stream chunk: {e}"))),
    }
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ChatError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|env| env.error.message)
        .unwrap_or(body);

    error!(%status, %message, "completion request returned HTTP error");
    Err(ChatError::Upstream {
        status: status.as_u16(),
        message,
    })
}
