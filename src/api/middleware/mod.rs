//! Middleware stack.
//!
//! Execution order (outermost → innermost):
//! 1. Access log: every request, including static files
//! 2. Session: cookie → `SessionId`, on session-backed routes only

pub mod access_log;
pub mod session;
