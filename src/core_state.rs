//! Process-wide application state.
//!
//! Built once at start-up and shared by every request through `Arc`.
//! Everything except the session store is read-only after construction.

use std::sync::Arc;
use std::time::Instant;

use crate::chat::{ChatBackend, OpenAiCompatibleClient};
use crate::classifier::ClassifierService;
use crate::config::AppConfig;
use crate::knowledge::KnowledgeBase;
use crate::session::SessionStore;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Cannot prepare data directory {path}: {source}")]
    DataDir {
        path: String,
        source: std::io::Error,
    },
    #[error("AI client initialization failed: {0}")]
    Chat(#[from] crate::chat::ChatError),
}

pub struct CoreState {
    pub config: AppConfig,
    pub classifier: ClassifierService,
    pub knowledge: KnowledgeBase,
    pub sessions: SessionStore,
    pub chat: Arc<dyn ChatBackend>,
    started_at: Instant,
}

impl CoreState {
    /// Assemble state from already-built parts.
    pub fn new(config: AppConfig, classifier: ClassifierService, chat: Arc<dyn ChatBackend>) -> Self {
        let sessions = SessionStore::new(config.session_ttl, config.static_dir());
        Self {
            config,
            classifier,
            knowledge: KnowledgeBase::builtin(),
            sessions,
            chat,
            started_at: Instant::now(),
        }
    }

    /// Production wiring: create directories, load the model, build the
    /// hosted AI client.
    pub fn from_config(config: AppConfig) -> Result<Self, CoreError> {
        let images = config.static_images_dir();
        std::fs::create_dir_all(&images).map_err(|source| CoreError::DataDir {
            path: images.display().to_string(),
            source,
        })?;

        let classifier = ClassifierService::load(&config);
        let chat: Arc<dyn ChatBackend> = Arc::new(OpenAiCompatibleClient::new(&config.llm)?);

        let state = Self::new(config, classifier, chat);
        tracing::info!(
            base_dir = %state.config.base_dir.display(),
            model_loaded = state.classifier.is_model_loaded(),
            classes = state.classifier.class_names().len(),
            diseases = state.knowledge.len(),
            llm_model = state.chat.model(),
            "Application state ready"
        );
        Ok(state)
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_creates_image_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::with_base_dir(dir.path());
        let state = CoreState::from_config(config).unwrap();
        assert!(dir.path().join("static/images").is_dir());
        assert!(!state.classifier.is_model_loaded());
        assert!(state.knowledge.contains("Strawberry", "Leaf scorch"));
        assert!(state.sessions.is_empty());
    }
}
