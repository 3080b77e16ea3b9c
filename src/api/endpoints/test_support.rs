//! Shared fixtures for router-level endpoint tests.

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use crate::api::app_router;
use crate::chat::MockChatBackend;
use crate::classifier::labels::default_class_names;
use crate::classifier::preprocess::sample_png;
use crate::classifier::{ClassifierService, ImageClassifier, MockClassifier};
use crate::config::{AppConfig, IMG_SIZE};
use crate::core_state::CoreState;

pub(crate) const CHAT_REPLY: &str = "Remove infected leaves and water at the base.";

pub(crate) struct Harness {
    _dir: TempDir,
    pub core: Arc<CoreState>,
    pub chat: Arc<MockChatBackend>,
}

impl Harness {
    /// Model that always answers "Strawberry___Leaf_scorch" at 97.77 %.
    pub fn new() -> Self {
        let names = default_class_names();
        let idx = names
            .iter()
            .position(|n| n == "Strawberry___Leaf_scorch")
            .unwrap();
        let model = MockClassifier::peaked(names.len(), idx, 0.9777);
        Self::build(Some(model), names, MockChatBackend::new(CHAT_REPLY))
    }

    pub fn without_model() -> Self {
        Self::build(None, default_class_names(), MockChatBackend::new(CHAT_REPLY))
    }

    /// Model with a single class, so every upload predicts `raw_class`.
    pub fn predicting(raw_class: &str) -> Self {
        let model = MockClassifier::peaked(1, 0, 0.8);
        Self::build(
            Some(model),
            vec![raw_class.to_string()],
            MockChatBackend::new(CHAT_REPLY),
        )
    }

    pub fn with_chat(chat: MockChatBackend) -> Self {
        let names = default_class_names();
        let model = MockClassifier::peaked(names.len(), 0, 0.9);
        Self::build(Some(model), names, chat)
    }

    fn build(model: Option<MockClassifier>, class_names: Vec<String>, chat: MockChatBackend) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::with_base_dir(dir.path());
        let model = model.map(|m| Box::new(m) as Box<dyn ImageClassifier>);
        let classifier = ClassifierService::new(model, class_names, IMG_SIZE);
        let chat = Arc::new(chat);
        let core = Arc::new(CoreState::new(config, classifier, chat.clone()));
        Self { _dir: dir, core, chat }
    }

    pub fn images_dir(&self) -> PathBuf {
        self.core.config.static_images_dir()
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        app_router(self.core.clone()).oneshot(request).await.unwrap()
    }

    /// Upload a leaf and return the `name=value` cookie pair of the session.
    pub async fn predicted_session(&self) -> String {
        let response = self
            .send(multipart_request("/predict", "file", Some("leaf.png"), &leaf_png()))
            .await;
        assert!(response.status().is_success(), "upload failed: {}", response.status());
        cookie_pair(&response).expect("session cookie")
    }

    /// A session that exists but has no prediction.
    pub async fn empty_session(&self) -> String {
        let response = self.send(get("/result")).await;
        cookie_pair(&response).expect("session cookie")
    }
}

pub(crate) fn leaf_png() -> Vec<u8> {
    sample_png(32, 32, [60, 140, 50])
}

pub(crate) fn cookie_pair(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

pub(crate) fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub(crate) fn with_cookie(mut request: Request<Body>, cookie: &str) -> Request<Body> {
    request
        .headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    request
}

pub(crate) fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub(crate) fn multipart_request(
    uri: &str,
    field: &str,
    file_name: Option<&str>,
    bytes: &[u8],
) -> Request<Body> {
    let boundary = "plantcare-test-boundary";
    let disposition = match file_name {
        Some(name) => format!("form-data; name=\"{field}\"; filename=\"{name}\""),
        None => format!("form-data; name=\"{field}\""),
    };
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(format!("Content-Disposition: {disposition}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub(crate) async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub(crate) async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
