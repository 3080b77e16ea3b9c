//! Channel-based relay from a streamed completion to the HTTP response.
//!
//! A spawned task pulls deltas from the backend and pushes them into a
//! bounded channel as [`StreamEvent`]s. The sequence always ends with
//! `Done`, also after an `Error`; only a clean finish carries the text. Dropping the receiver stops the task at
//! its next poll, which also drops the upstream request.

use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::mpsc;

use super::backend::{ChatBackend, CompletionRequest};

pub const RELAY_CAPACITY: usize = 32;

pub const DONE_SENTINEL: &str = "[DONE]";
pub const ERROR_PREFIX: &str = "[ERROR]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Token(String),
    Error(String),
    /// Terminal marker. `full_text` is the assembled reply, or `None` when
    /// the stream ended with an error.
    Done { full_text: Option<String> },
}

impl StreamEvent {
    /// Payload for one SSE `data:` line. Newlines are escaped as `\n` so
    /// each event stays on a single line.
    pub fn to_sse_data(&self) -> String {
        match self {
            StreamEvent::Token(text) => escape_newlines(text),
            StreamEvent::Error(message) => format!("{ERROR_PREFIX} {}", escape_newlines(message)),
            StreamEvent::Done { .. } => DONE_SENTINEL.to_string(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done { .. })
    }
}

/// `\n` becomes the two characters `\` `n`; carriage returns are dropped.
pub fn escape_newlines(text: &str) -> String {
    text.replace('\r', "").replace('\n', "\\n")
}

/// Start relaying `request` from `backend`. Events arrive in upstream order.
pub fn spawn_relay(backend: Arc<dyn ChatBackend>, request: CompletionRequest) -> mpsc::Receiver<StreamEvent> {
    let (tx, rx) = mpsc::channel(RELAY_CAPACITY);

    tokio::spawn(async move {
        let full_text = pump(backend.as_ref(), request, &tx).await;
        if tx.send(StreamEvent::Done { full_text }).await.is_err() {
            tracing::debug!("Chat client disconnected before completion");
        }
    });

    rx
}

async fn pump(
    backend: &dyn ChatBackend,
    request: CompletionRequest,
    tx: &mpsc::Sender<StreamEvent>,
) -> Option<String> {
    let mut full_text = String::new();

    let opened = tokio::select! {
        _ = tx.closed() => return None,
        opened = backend.stream(request) => opened,
    };
    let mut deltas = match opened {
        Ok(deltas) => deltas,
        Err(e) => {
            tracing::warn!(model = backend.model(), error = %e, "Chat stream failed to open");
            let _ = tx.send(StreamEvent::Error(e.to_string())).await;
            return None;
        }
    };

    loop {
        let next = tokio::select! {
            _ = tx.closed() => return None,
            next = deltas.next() => next,
        };
        match next {
            Some(Ok(text)) if text.is_empty() => {}
            Some(Ok(text)) => {
                full_text.push_str(&text);
                if tx.send(StreamEvent::Token(text)).await.is_err() {
                    return None;
                }
            }
            Some(Err(e)) => {
                tracing::warn!(model = backend.model(), error = %e, "Chat stream interrupted");
                let _ = tx.send(StreamEvent::Error(e.to_string())).await;
                return None;
            }
            None => return Some(full_text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use futures_util::future::BoxFuture;
    use futures_util::stream;

    use crate::chat::backend::{DeltaStream, MockChatBackend, MockStep};
    use crate::chat::{ChatError, ChatMessage};

    /// Endless-ish upstream that counts how many deltas were pulled.
    struct CountingBackend {
        pulled: Arc<AtomicUsize>,
    }

    impl ChatBackend for CountingBackend {
        fn complete(&self, _request: CompletionRequest) -> BoxFuture<'_, Result<String, ChatError>> {
            Box::pin(async { Err(ChatError::EmptyResponse) })
        }

        fn stream(&self, _request: CompletionRequest) -> BoxFuture<'_, Result<DeltaStream, ChatError>> {
            let pulled = self.pulled.clone();
            let deltas: DeltaStream = stream::iter(0..1000)
                .map(move |i| {
                    pulled.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ChatError>(format!("t{i} "))
                })
                .boxed();
            Box::pin(async move { Ok(deltas) })
        }

        fn model(&self) -> &str {
            "counting"
        }
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            messages: vec![ChatMessage::user("why are my leaves brown?")],
            max_tokens: 64,
        }
    }

    async fn drain(mut rx: mpsc::Receiver<StreamEvent>) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn relays_in_order_then_done() {
        let backend = Arc::new(MockChatBackend::new("").with_script(vec![
            MockStep::Delta("Leaf ".into()),
            MockStep::Delta("scorch".into()),
        ]));
        let events = drain(spawn_relay(backend, request())).await;
        assert_eq!(
            events,
            vec![
                StreamEvent::Token("Leaf ".into()),
                StreamEvent::Token("scorch".into()),
                StreamEvent::Done {
                    full_text: Some("Leaf scorch".into())
                },
            ]
        );
    }

    #[tokio::test]
    async fn upstream_error_is_followed_by_done() {
        let backend = Arc::new(MockChatBackend::new("").with_script(vec![
            MockStep::Delta("partial".into()),
            MockStep::Fail("connection reset".into()),
            MockStep::Delta("never sent".into()),
        ]));
        let events = drain(spawn_relay(backend, request())).await;
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], StreamEvent::Token("partial".into()));
        assert!(matches!(&events[1], StreamEvent::Error(m) if m.contains("connection reset")));
        assert_eq!(events[2], StreamEvent::Done { full_text: None });
    }

    #[tokio::test]
    async fn open_failure_yields_error_and_done() {
        let backend = Arc::new(MockChatBackend::failing("invalid api key"));
        let events = drain(spawn_relay(backend, request())).await;
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], StreamEvent::Error(_)));
        assert_eq!(
            events[1],
            StreamEvent::Done { full_text: None }
        );
    }

    #[tokio::test]
    async fn empty_deltas_are_skipped() {
        let backend = Arc::new(MockChatBackend::new("").with_script(vec![
            MockStep::Delta(String::new()),
            MockStep::Delta("ok".into()),
        ]));
        let events = drain(spawn_relay(backend, request())).await;
        assert_eq!(events[0], StreamEvent::Token("ok".into()));
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn empty_stream_completes_with_empty_text() {
        let backend = Arc::new(MockChatBackend::new(""));
        let events = drain(spawn_relay(backend, request())).await;
        assert_eq!(
            events,
            vec![StreamEvent::Done {
                full_text: Some(String::new())
            }]
        );
    }

    #[tokio::test]
    async fn dropped_receiver_stops_relay() {
        let pulled = Arc::new(AtomicUsize::new(0));
        let backend = Arc::new(CountingBackend {
            pulled: pulled.clone(),
        });
        let mut rx = spawn_relay(backend.clone(), request());
        assert!(matches!(rx.recv().await, Some(StreamEvent::Token(_))));
        drop(rx);

        // The relay task holds the only other reference to the backend.
        tokio::time::timeout(Duration::from_secs(5), async {
            while Arc::strong_count(&backend) > 1 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("relay task should exit after the receiver is dropped");

        let pulled = pulled.load(Ordering::SeqCst);
        assert!(pulled < 1000, "relay kept pulling: {pulled}");
        assert!(pulled <= RELAY_CAPACITY + 3, "pulled {pulled} deltas");
    }

    #[test]
    fn sse_payloads() {
        assert_eq!(StreamEvent::Token("a\nb".into()).to_sse_data(), "a\\nb");
        assert_eq!(StreamEvent::Token("a\r\nb".into()).to_sse_data(), "a\\nb");
        assert_eq!(StreamEvent::Error("boom".into()).to_sse_data(), "[ERROR] boom");
        assert_eq!(
            StreamEvent::Done { full_text: None }.to_sse_data(),
            "[DONE]"
        );
    }
}
