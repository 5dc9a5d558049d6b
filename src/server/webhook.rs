//! Webhook endpoint handler.
//!
//! Routes a delivery by its `X-GitHub-Event` header to the matching
//! processor operation and reports what happened in two response
//! headers:
//!
//! - `did-process`: a handler is registered for the event name
//! - `did-match-rule`: the event matched at least one routing rule
//!
//! Failures toward downstream rule services are never visible here, only
//! in commit statuses; this response tells the webhook caller whether the
//! delivery was understood at all.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::dispatch::DispatchError;
use crate::webhooks::{is_supported_event, parse_webhook, ParseError, WebhookEvent};

use super::AppState;

/// Header name for the GitHub event type.
const HEADER_EVENT: &str = "x-github-event";
/// Response header: was a handler registered for the event name?
const HEADER_PROCESSED: &str = "did-process";
/// Response header: did any routing rule match?
const HEADER_MATCHED: &str = "did-match-rule";

/// Errors that turn into non-200 webhook responses.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The payload for a supported event did not parse.
    #[error("invalid payload: {0}")]
    InvalidPayload(#[from] ParseError),

    /// Processing failed after the event was accepted (e.g. clone
    /// failure).
    #[error("dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebhookError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            WebhookError::Dispatch(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

/// Webhook handler.
///
/// Always answers 200 for deliveries it understood (including ones it
/// chose to ignore); the two response headers carry the outcome.
pub async fn webhook_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, WebhookError> {
    let event_name = headers
        .get(HEADER_EVENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    info!(event = %event_name, "incoming webhook");

    if !is_supported_event(&event_name) {
        debug!(event = %event_name, "no handler for event");
        return Ok(outcome_response(false, false));
    }

    let Some(event) = parse_webhook(&event_name, &body)? else {
        // Supported event name, but an action we do not act on.
        return Ok(outcome_response(true, false));
    };

    let processor = app_state.processor();
    let matched = match event {
        WebhookEvent::Push(push) => processor.process_push(push).await,
        WebhookEvent::PullRequest(pr) => processor.process_pull_request(pr).await,
        WebhookEvent::IssueComment(comment) => processor.process_issue_comment(comment).await,
    };

    match matched {
        Ok(matched) => Ok(outcome_response(true, matched)),
        Err(e) => {
            warn!(event = %event_name, error = %e, "event processing failed");
            Err(e.into())
        }
    }
}

fn outcome_response(processed: bool, matched: bool) -> Response {
    let yes_no = |b: bool| if b { "yes" } else { "no" };
    (
        StatusCode::OK,
        [
            (HEADER_PROCESSED, yes_no(processed)),
            (HEADER_MATCHED, yes_no(matched)),
        ],
        "{}",
    )
        .into_response()
}
