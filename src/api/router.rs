//! HTTP router.
//!
//! Middleware stack (outermost → innermost):
//! 1. Access log → 2. Session resolver (session routes only)

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::services::ServeDir;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::config::MAX_UPLOAD_BYTES;
use crate::core_state::CoreState;

/// Build the application router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer
/// of the session routes). Endpoint handlers use `State<ApiContext>`.
pub fn app_router(core: Arc<CoreState>) -> Router {
    build_router(ApiContext::new(core))
}

fn build_router(ctx: ApiContext) -> Router {
    let static_dir = ctx.core.config.static_dir();

    // Routes that read or write the caller's session.
    let session_routes = Router::new()
        .route("/predict", post(endpoints::predict::upload))
        .route("/result", get(endpoints::result::show))
        .route("/report", get(endpoints::report::download))
        .route("/learn", post(endpoints::learn::explain))
        .route("/chat", post(endpoints::chat::converse))
        .with_state(ctx.clone())
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(axum::middleware::from_fn(middleware::session::attach_session))
        .layer(axum::Extension(ctx.clone()));

    let public = Router::new()
        .route("/health", get(endpoints::health::check))
        .with_state(ctx);

    Router::new()
        .merge(session_routes)
        .merge(public)
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(axum::middleware::from_fn(middleware::access_log::log_access))
}

#[cfg(test)]
mod tests {
    use axum::http::{header, StatusCode};

    use crate::api::endpoints::test_support::*;

    #[tokio::test]
    async fn unknown_route_is_404() {
        let harness = Harness::new();
        let response = harness.send(get("/nope")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn known_session_is_not_reissued() {
        let harness = Harness::new();
        let cookie = harness.predicted_session().await;

        let response = harness.send(with_cookie(get("/result"), &cookie)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        assert_eq!(harness.core.sessions.len(), 1);
    }

    #[tokio::test]
    async fn stale_cookie_gets_a_fresh_session() {
        let harness = Harness::new();
        let stale = format!("plantcare_session={}", uuid::Uuid::new_v4());

        let response = harness.send(with_cookie(get("/result"), &stale)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let issued = cookie_pair(&response).expect("new cookie");
        assert_ne!(issued, stale);
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let harness = Harness::new();
        let first = harness.predicted_session().await;
        let second = harness.empty_session().await;
        assert_ne!(first, second);

        let response = harness.send(with_cookie(get("/result"), &second)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn second_upload_replaces_first_image() {
        let harness = Harness::new();
        let cookie = harness.predicted_session().await;
        let again = harness
            .send(with_cookie(
                multipart_request("/predict", "file", Some("leaf.png"), &leaf_png()),
                &cookie,
            ))
            .await;
        assert_eq!(again.status(), StatusCode::OK);

        let images: Vec<_> = std::fs::read_dir(harness.images_dir()).unwrap().collect();
        assert_eq!(images.len(), 1);
    }
}
