//! Webhook endpoint handler.
//!
//! Accepts Bitbucket pull request deliveries, keeps only merged pull
//! requests, and hands them to the ingestion queue. Processing happens
//! later in the cascade worker.

use axum::body::Bytes;
use axum::extract::{Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::AppState;
use crate::types::{EventRejection, MergeEvent, PrState, PullRequestEvent};
use crate::worker::EnqueueError;

/// Errors that can occur when accepting a webhook.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Token query parameter does not match the configured secret.
    #[error("invalid token")]
    InvalidToken,

    /// Invalid JSON body.
    #[error("invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// No pull request in the payload.
    #[error("missing pull request in payload")]
    MissingPullRequest,

    /// A field needed to process the merge is absent.
    #[error("missing field in payload: {0}")]
    MissingField(&'static str),

    /// The pull request is not merged.
    #[error("pull request state is {0}, expected MERGED")]
    NotMerged(PrState),

    /// The ingestion queue is at capacity.
    #[error("too many pending merges")]
    QueueFull,

    /// The cascade worker is gone.
    #[error("cascade worker unavailable")]
    QueueClosed,
}

impl From<EventRejection> for WebhookError {
    fn from(rejection: EventRejection) -> Self {
        match rejection {
            EventRejection::MissingPullRequest => Self::MissingPullRequest,
            EventRejection::NotMerged(state) => Self::NotMerged(state),
            EventRejection::MissingField(field) => Self::MissingField(field),
        }
    }
}

impl From<EnqueueError> for WebhookError {
    fn from(e: EnqueueError) -> Self {
        match e {
            EnqueueError::Full => Self::QueueFull,
            EnqueueError::Closed => Self::QueueClosed,
        }
    }
}

impl WebhookError {
    /// HTTP status reported for this error
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidToken => StatusCode::FORBIDDEN,
            Self::InvalidJson(_) | Self::MissingPullRequest | Self::MissingField(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotMerged(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::QueueFull => StatusCode::TOO_MANY_REQUESTS,
            Self::QueueClosed => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

/// Query parameters of the webhook URL.
#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    token: Option<String>,
}

/// Rejects requests whose `token` query parameter differs from the
/// configured secret.
pub async fn require_token(
    State(app_state): State<AppState>,
    Query(query): Query<TokenQuery>,
    request: Request,
    next: Next,
) -> Response {
    if query.token.as_deref().unwrap_or_default() != app_state.token() {
        warn!("webhook rejected: wrong token");
        return WebhookError::InvalidToken.into_response();
    }
    next.run(request).await
}

/// Webhook handler.
///
/// # Response
///
/// - 201 Created: merge event queued
/// - 400 Bad Request: malformed body or missing pull request/fields
/// - 422 Unprocessable Entity: pull request is not merged
/// - 429 Too Many Requests: queue at capacity
/// - 503 Service Unavailable: worker stopped
pub async fn webhook_handler(
    State(app_state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, &'static str), WebhookError> {
    let payload: PullRequestEvent = serde_json::from_slice(&body)?;

    let event = MergeEvent::from_webhook(&payload).map_err(|rejection| {
        debug!(?rejection, "webhook ignored");
        WebhookError::from(rejection)
    })?;

    let repo = event.repository.name.clone();
    let destination = event.destination_branch.clone();

    app_state.queue().try_enqueue(event).map_err(|e| {
        warn!(repo = %repo, destination = %destination, error = %e, "merge event rejected");
        WebhookError::from(e)
    })?;

    info!(repo = %repo, destination = %destination, "merge event queued");
    Ok((StatusCode::CREATED, "Created"))
}
