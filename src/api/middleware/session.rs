//! Session middleware.
//!
//! Resolves the session cookie into a `SessionId` request extension and
//! issues `Set-Cookie` when a new session had to be created.

use axum::http::{header, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, SessionId};
use crate::session::{session_cookie, session_id_from_headers};

pub async fn attach_session(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or_else(|| ApiError::Internal("ApiContext extension missing".into()))?;

    let presented = session_id_from_headers(req.headers());
    let (id, created) = ctx.core.sessions.resolve(presented)?;
    req.extensions_mut().insert(SessionId(id));

    let mut response = next.run(req).await;
    if created {
        if let Ok(value) = HeaderValue::from_str(&session_cookie(id)) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    Ok(response)
}
