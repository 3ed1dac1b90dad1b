//! HTTP server for the cascade bot.
//!
//! # Endpoints
//!
//! - `POST /?token=<secret>` - Accepts Bitbucket pull request webhooks
//! - `GET /health` - Returns 200 if server is running

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};

pub mod webhook;

pub use webhook::{WebhookError, require_token, webhook_handler};

use crate::worker::IngestionQueue;

/// Shared application state, passed to handlers via Axum's `State`
/// extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Producer side of the ingestion queue.
    queue: IngestionQueue,

    /// Shared secret expected in the `token` query parameter.
    token: String,
}

impl AppState {
    /// Creates a new `AppState`.
    pub fn new(queue: IngestionQueue, token: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                queue,
                token: token.into(),
            }),
        }
    }

    /// Returns the ingestion queue.
    pub fn queue(&self) -> &IngestionQueue {
        &self.inner.queue
    }

    /// Returns the webhook secret.
    pub fn token(&self) -> &str {
        &self.inner.token
    }
}

/// Liveness check.
pub async fn health_handler() -> &'static str {
    "OK"
}

/// Builds the axum Router with all endpoints.
pub fn build_router(app_state: AppState) -> axum::Router {
    axum::Router::new()
        .route(
            "/",
            post(webhook_handler).layer(middleware::from_fn_with_state(
                app_state.clone(),
                require_token,
            )),
        )
        .route("/health", get(health_handler))
        .with_state(app_state)
}
