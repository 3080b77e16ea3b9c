//! HTTP surface: router, middleware, endpoints and server lifecycle.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::app_router;
pub use server::{start_server, AppServer, ServerError};
pub use types::ApiContext;
