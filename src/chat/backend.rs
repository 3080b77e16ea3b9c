use std::sync::Mutex;

use futures_util::future::BoxFuture;
use futures_util::stream::{self, BoxStream, StreamExt};

use super::{ChatError, ChatMessage};

/// Incremental text deltas from the completion service, in arrival order.
pub type DeltaStream = BoxStream<'static, Result<String, ChatError>>;

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
}

/// Hosted chat-completion service abstraction (allows mocking).
pub trait ChatBackend: Send + Sync {
    /// Single round-trip returning the whole reply.
    fn complete(&self, request: CompletionRequest) -> BoxFuture<'_, Result<String, ChatError>>;

    /// Open a streamed completion. Errors before the first delta are returned
    /// here; later failures arrive as `Err` items on the stream.
    fn stream(&self, request: CompletionRequest) -> BoxFuture<'_, Result<DeltaStream, ChatError>>;

    /// Model identifier, for logging.
    fn model(&self) -> &str;
}

/// Scripted step for [`MockChatBackend`] streams.
#[derive(Debug, Clone)]
pub enum MockStep {
    Delta(String),
    Fail(String),
}

/// Mock chat backend for testing. Replays a fixed script.
pub struct MockChatBackend {
    reply: Result<String, String>,
    script: Vec<MockStep>,
    open_error: Option<String>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockChatBackend {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            script: reply
                .split_inclusive(' ')
                .map(|w| MockStep::Delta(w.to_string()))
                .collect(),
            open_error: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            script: Vec::new(),
            open_error: Some(message.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_script(mut self, script: Vec<MockStep>) -> Self {
        self.script = script;
        self
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn record(&self, request: CompletionRequest) {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
    }
}

impl ChatBackend for MockChatBackend {
    fn complete(&self, request: CompletionRequest) -> BoxFuture<'_, Result<String, ChatError>> {
        self.record(request);
        let result = self
            .reply
            .clone()
            .map_err(|message| ChatError::Upstream { status: 500, message });
        Box::pin(async move { result })
    }

    fn stream(&self, request: CompletionRequest) -> BoxFuture<'_, Result<DeltaStream, ChatError>> {
        self.record(request);
        let opened = match &self.open_error {
            Some(message) => Err(ChatError::Connection(message.clone())),
            None => {
                let items: Vec<Result<String, ChatError>> = self
                    .script
                    .iter()
                    .map(|step| match step {
                        MockStep::Delta(text) => Ok(text.clone()),
                        MockStep::Fail(message) => Err(ChatError::Stream(message.clone())),
                    })
                    .collect();
                Ok(stream::iter(items).boxed())
            }
        };
        Box::pin(async move { opened })
    }

    fn model(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CompletionRequest {
        CompletionRequest {
            messages: vec![ChatMessage::user("hello")],
            max_tokens: 16,
        }
    }

    #[tokio::test]
    async fn mock_complete_returns_reply_and_records() {
        let backend = MockChatBackend::new("Leaf scorch is fungal.");
        let text = backend.complete(request()).await.unwrap();
        assert_eq!(text, "Leaf scorch is fungal.");
        assert_eq!(backend.requests().len(), 1);
        assert_eq!(backend.requests()[0].max_tokens, 16);
    }

    #[tokio::test]
    async fn mock_stream_splits_reply_into_words() {
        let backend = MockChatBackend::new("a b c");
        let deltas: Vec<String> = backend
            .stream(request())
            .await
            .unwrap()
            .map(|d| d.unwrap())
            .collect()
            .await;
        assert_eq!(deltas, vec!["a ", "b ", "c"]);
    }

    #[tokio::test]
    async fn failing_mock_errors_on_both_paths() {
        let backend = MockChatBackend::failing("rate limited");
        assert!(backend.complete(request()).await.is_err());
        assert!(backend.stream(request()).await.is_err());
    }
}
