//! Per-user server-side sessions.
//!
//! A session holds the latest prediction, the re-saved upload image and
//! the chat history. Sessions live in memory only and expire after a
//! period of inactivity; an expired session's image is deleted with it.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use axum::http::{header, HeaderMap};
use uuid::Uuid;

use crate::chat::ChatMessage;
use crate::classifier::Prediction;

pub const SESSION_COOKIE: &str = "plantcare_session";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session store lock poisoned")]
    LockPoisoned,
}

#[derive(Debug, Clone)]
pub struct WebSession {
    pub prediction: Option<Prediction>,
    /// Path relative to the static root, e.g. `images/upload_ab12.jpg`.
    pub image_path: Option<String>,
    pub history: Vec<ChatMessage>,
    last_access: Instant,
}

impl WebSession {
    fn new() -> Self {
        Self {
            prediction: None,
            image_path: None,
            history: Vec::new(),
            last_access: Instant::now(),
        }
    }
}

pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, WebSession>>,
    ttl: Duration,
    static_dir: PathBuf,
}

impl SessionStore {
    pub fn new(ttl: Duration, static_dir: impl Into<PathBuf>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
            static_dir: static_dir.into(),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<Uuid, WebSession>>, SessionError> {
        self.sessions.read().map_err(|_| SessionError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<Uuid, WebSession>>, SessionError> {
        self.sessions.write().map_err(|_| SessionError::LockPoisoned)
    }

    /// Return the live session for `id`, or create a new one.
    ///
    /// The flag is `true` when a new session was created and the caller must
    /// send a cookie.
    pub fn resolve(&self, id: Option<Uuid>) -> Result<(Uuid, bool), SessionError> {
        let now = Instant::now();
        {
            let mut sessions = self.write()?;
            if let Some(id) = id {
                if let Some(session) = sessions.get_mut(&id) {
                    if now.duration_since(session.last_access) < self.ttl {
                        session.last_access = now;
                        return Ok((id, false));
                    }
                }
            }
        }

        self.purge_expired()?;
        let id = Uuid::new_v4();
        self.write()?.insert(id, WebSession::new());
        tracing::debug!(session = %id, "Session created");
        Ok((id, true))
    }

    /// Snapshot of a live session.
    pub fn get(&self, id: Uuid) -> Result<Option<WebSession>, SessionError> {
        let sessions = self.read()?;
        Ok(sessions
            .get(&id)
            .filter(|s| s.last_access.elapsed() < self.ttl)
            .cloned())
    }

    /// Store a new prediction. Replaces the previous image (deleting its
    /// file) and clears the chat history.
    pub fn set_prediction(
        &self,
        id: Uuid,
        prediction: Prediction,
        image_path: Option<String>,
    ) -> Result<(), SessionError> {
        let previous_image = {
            let mut sessions = self.write()?;
            let session = sessions.entry(id).or_insert_with(WebSession::new);
            session.prediction = Some(prediction);
            session.history.clear();
            session.last_access = Instant::now();
            std::mem::replace(&mut session.image_path, image_path)
        };
        if let Some(old) = previous_image {
            self.remove_image(&old);
        }
        Ok(())
    }

    /// Replace the stored history with the client-submitted one.
    pub fn set_history(&self, id: Uuid, history: Vec<ChatMessage>) -> Result<(), SessionError> {
        if let Some(session) = self.write()?.get_mut(&id) {
            session.history = history;
            session.last_access = Instant::now();
        }
        Ok(())
    }

    /// Record a finished assistant reply.
    pub fn append_assistant(&self, id: Uuid, text: String) -> Result<(), SessionError> {
        if text.is_empty() {
            return Ok(());
        }
        if let Some(session) = self.write()?.get_mut(&id) {
            session.history.push(ChatMessage::assistant(text));
        }
        Ok(())
    }

    /// Drop expired sessions and their images. Returns how many were removed.
    pub fn purge_expired(&self) -> Result<usize, SessionError> {
        let expired: Vec<WebSession> = {
            let mut sessions = self.write()?;
            let ids: Vec<Uuid> = sessions
                .iter()
                .filter(|(_, s)| s.last_access.elapsed() >= self.ttl)
                .map(|(id, _)| *id)
                .collect();
            ids.iter().filter_map(|id| sessions.remove(id)).collect()
        };
        for session in &expired {
            if let Some(image) = &session.image_path {
                self.remove_image(image);
            }
        }
        if !expired.is_empty() {
            tracing::info!(count = expired.len(), "Expired sessions purged");
        }
        Ok(expired.len())
    }

    pub fn len(&self) -> usize {
        self.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn remove_image(&self, relative: &str) {
        let path = self.static_dir.join(relative);
        if let Err(e) = std::fs::remove_file(&path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove session image");
            }
        }
    }
}

/// Session id from the request's `Cookie` header, if well-formed.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

/// `Set-Cookie` value for a session id.
pub fn session_cookie(id: Uuid) -> String {
    format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax")
}
