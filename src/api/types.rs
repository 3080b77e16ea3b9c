//! Shared types for the HTTP layer.

use std::sync::Arc;

use uuid::Uuid;

use crate::core_state::CoreState;

/// Shared context for all routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self { core }
    }
}

/// Session of the current request, injected by the session middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionId(pub Uuid);
