//! Webhook payload parsing.
//!
//! Raw GitHub JSON payloads are deserialized into minimal `Raw*` structs
//! and then validated into the typed events the dispatcher consumes.
//!
//! # Parsing strategy
//!
//! 1. The event type comes from the `X-GitHub-Event` header
//! 2. The payload is parsed according to the event type
//! 3. Unknown event names and irrelevant pull-request actions return
//!    `Ok(None)` (ignored, not an error)
//! 4. Malformed payloads return `Err` with details

use serde::Deserialize;
use thiserror::Error;

use crate::types::Sha;

use super::events::{
    EventTimestamp, IssueCommentEvent, PrAction, PullRequestEvent, PushEvent,
};
use super::WebhookEvent;

/// Error type for webhook parsing failures.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON deserialization failed (includes missing required fields).
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parses a webhook payload into a typed event.
///
/// # Returns
///
/// * `Ok(Some(event))` - a supported event with a payload the dispatcher
///   might act on
/// * `Ok(None)` - an event name with no registered handler, or a
///   pull-request action outside the modeled set
/// * `Err(e)` - a supported event with a malformed payload
pub fn parse_webhook(event_name: &str, payload: &[u8]) -> Result<Option<WebhookEvent>, ParseError> {
    match event_name {
        "push" => parse_push(payload).map(|e| Some(WebhookEvent::Push(e))),
        "pull_request" => parse_pull_request(payload).map(|opt| opt.map(WebhookEvent::PullRequest)),
        "issue_comment" => parse_issue_comment(payload).map(|e| Some(WebhookEvent::IssueComment(e))),
        // No handler registered for this event name.
        _ => Ok(None),
    }
}

// ============================================================================
// Raw payload structures
//
// These match GitHub's webhook JSON. Fields that may legitimately be
// absent are Options; everything else is required and a missing field is
// a parse error.
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawPushPayload {
    #[serde(rename = "ref")]
    ref_name: String,
    before: String,
    after: String,
    repository: RawPushRepository,
}

#[derive(Debug, Deserialize)]
struct RawPushRepository {
    clone_url: String,
    default_branch: String,
    statuses_url: String,
    pushed_at: EventTimestamp,
}

fn parse_push(payload: &[u8]) -> Result<PushEvent, ParseError> {
    let raw: RawPushPayload = serde_json::from_slice(payload)?;
    Ok(PushEvent {
        ref_name: raw.ref_name,
        before: Sha::new(raw.before),
        after: Sha::new(raw.after),
        clone_url: raw.repository.clone_url,
        default_branch: raw.repository.default_branch,
        statuses_url: raw.repository.statuses_url,
        pushed_at: raw.repository.pushed_at,
    })
}

#[derive(Debug, Deserialize)]
struct RawPullRequestPayload {
    action: String,
    pull_request: RawPullRequest,
    repository: RawPrRepository,
}

#[derive(Debug, Deserialize)]
struct RawPullRequest {
    base: RawPrRef,
    head: RawPrRef,
    updated_at: EventTimestamp,
}

#[derive(Debug, Deserialize)]
struct RawPrRef {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct RawPrRepository {
    clone_url: String,
    statuses_url: String,
}

fn parse_pull_request(payload: &[u8]) -> Result<Option<PullRequestEvent>, ParseError> {
    let raw: RawPullRequestPayload = serde_json::from_slice(payload)?;

    let action = match raw.action.as_str() {
        "opened" => PrAction::Opened,
        "reopened" => PrAction::Reopened,
        "synchronize" => PrAction::Synchronize,
        "closed" => PrAction::Closed,
        "edited" => PrAction::Edited,
        // Other actions (labeled, assigned, ...) are not relevant here.
        _ => return Ok(None),
    };

    Ok(Some(PullRequestEvent {
        action,
        base_sha: Sha::new(raw.pull_request.base.sha),
        head_sha: Sha::new(raw.pull_request.head.sha),
        clone_url: raw.repository.clone_url,
        statuses_url: raw.repository.statuses_url,
        updated_at: raw.pull_request.updated_at,
    }))
}

#[derive(Debug, Deserialize)]
struct RawIssueCommentPayload {
    comment: RawComment,
    issue: RawIssue,
}

#[derive(Debug, Deserialize)]
struct RawComment {
    body: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawIssue {
    // Present only when the "issue" is actually a pull request.
    pull_request: Option<RawIssuePullRequest>,
}

#[derive(Debug, Deserialize)]
struct RawIssuePullRequest {
    url: String,
}

fn parse_issue_comment(payload: &[u8]) -> Result<IssueCommentEvent, ParseError> {
    let raw: RawIssueCommentPayload = serde_json::from_slice(payload)?;
    Ok(IssueCommentEvent {
        body: raw.comment.body.unwrap_or_default(),
        pull_request_url: raw.issue.pull_request.map(|pr| pr.url),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_payload() -> serde_json::Value {
        serde_json::json!({
            "ref": "refs/heads/main",
            "before": "6113728f27ae82c7b1a177c8d03f9e96e0adf246",
            "after": "59b20b8d5c6ff8d09518454d4dd8b7a425be534b",
            "repository": {
                "clone_url": "https://github.com/ebay/thing.git",
                "default_branch": "main",
                "statuses_url": "https://api.github.com/repos/ebay/thing/statuses/{sha}",
                "pushed_at": 1620000000,
                "full_name": "ebay/thing"
            },
            "pusher": { "name": "octocat" }
        })
    }

    #[test]
    fn parses_push() {
        let payload = serde_json::to_vec(&push_payload()).unwrap();
        let event = parse_webhook("push", &payload).unwrap().unwrap();

        let WebhookEvent::Push(push) = event else {
            panic!("expected a push event");
        };
        assert_eq!(push.ref_name, "refs/heads/main");
        assert_eq!(push.default_branch, "main");
        assert_eq!(push.pushed_at, EventTimestamp::Epoch(1_620_000_000));
        assert!(push.is_default_branch());
    }

    #[test]
    fn parses_pull_request() {
        let payload = serde_json::json!({
            "action": "synchronize",
            "pull_request": {
                "base": { "sha": "a".repeat(40) },
                "head": { "sha": "b".repeat(40) },
                "updated_at": "2021-05-01T12:00:00Z"
            },
            "repository": {
                "clone_url": "https://github.com/ebay/thing.git",
                "statuses_url": "https://api.github.com/repos/ebay/thing/statuses/{sha}"
            }
        });
        let payload = serde_json::to_vec(&payload).unwrap();
        let event = parse_webhook("pull_request", &payload).unwrap().unwrap();

        let WebhookEvent::PullRequest(pr) = event else {
            panic!("expected a pull_request event");
        };
        assert_eq!(pr.action, PrAction::Synchronize);
        assert_eq!(pr.base_sha.as_str(), "a".repeat(40));
        assert_eq!(pr.head_sha.as_str(), "b".repeat(40));
    }

    #[test]
    fn irrelevant_pr_action_parses_to_none() {
        let payload = serde_json::json!({
            "action": "labeled",
            "pull_request": {
                "base": { "sha": "a".repeat(40) },
                "head": { "sha": "b".repeat(40) },
                "updated_at": "2021-05-01T12:00:00Z"
            },
            "repository": {
                "clone_url": "https://github.com/ebay/thing.git",
                "statuses_url": "https://api.github.com/repos/ebay/thing/statuses/{sha}"
            }
        });
        let payload = serde_json::to_vec(&payload).unwrap();
        assert!(parse_webhook("pull_request", &payload).unwrap().is_none());
    }

    #[test]
    fn parses_issue_comment_on_pr() {
        let payload = serde_json::json!({
            "action": "created",
            "comment": { "body": "retest change-relay/alarms" },
            "issue": {
                "number": 7,
                "pull_request": { "url": "https://api.github.com/repos/ebay/thing/pulls/7" }
            }
        });
        let payload = serde_json::to_vec(&payload).unwrap();
        let event = parse_webhook("issue_comment", &payload).unwrap().unwrap();

        let WebhookEvent::IssueComment(comment) = event else {
            panic!("expected an issue_comment event");
        };
        assert_eq!(comment.body, "retest change-relay/alarms");
        assert_eq!(
            comment.pull_request_url.as_deref(),
            Some("https://api.github.com/repos/ebay/thing/pulls/7")
        );
    }

    #[test]
    fn comment_on_plain_issue_has_no_pr_url() {
        let payload = serde_json::json!({
            "action": "created",
            "comment": { "body": "retest change-relay" },
            "issue": { "number": 7 }
        });
        let payload = serde_json::to_vec(&payload).unwrap();
        let event = parse_webhook("issue_comment", &payload).unwrap().unwrap();

        let WebhookEvent::IssueComment(comment) = event else {
            panic!("expected an issue_comment event");
        };
        assert!(comment.pull_request_url.is_none());
    }

    #[test]
    fn unknown_event_name_is_none() {
        assert!(parse_webhook("deployment", b"{}").unwrap().is_none());
    }

    #[test]
    fn malformed_push_is_an_error() {
        assert!(parse_webhook("push", b"{\"ref\": 5}").is_err());
        assert!(parse_webhook("push", b"not json").is_err());
    }
}
