//! Typed representations of the webhook events this service handles.
//!
//! Each type carries only the fields the dispatcher needs. Raw payload
//! deserialization lives in [`super::parser`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Sha;

/// An event timestamp as GitHub delivers it: `repository.pushed_at` is
/// epoch seconds, `updated_at` fields are ISO-8601 strings. Outbound
/// payloads always carry the ISO form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventTimestamp {
    Epoch(i64),
    Text(String),
}

impl EventTimestamp {
    /// The timestamp as an ISO-8601 string, converting epoch seconds at
    /// UTC. An epoch outside chrono's representable range falls back to
    /// the raw number.
    pub fn to_iso8601(&self) -> String {
        match self {
            EventTimestamp::Epoch(secs) => DateTime::<Utc>::from_timestamp(*secs, 0)
                .map(|dt| dt.to_rfc3339())
                .unwrap_or_else(|| secs.to_string()),
            EventTimestamp::Text(text) => text.clone(),
        }
    }
}

/// A push to a repository.
#[derive(Debug, Clone, PartialEq)]
pub struct PushEvent {
    /// The full ref that was pushed, e.g. `refs/heads/main`.
    pub ref_name: String,
    /// The commit the ref pointed at before the push (all-zero for a new
    /// branch).
    pub before: Sha,
    /// The commit the ref points at after the push (all-zero when the
    /// branch was deleted).
    pub after: Sha,
    pub clone_url: String,
    /// The repository's configured default branch; pushes elsewhere are
    /// ignored.
    pub default_branch: String,
    /// The `{sha}`-templated commit-status URL.
    pub statuses_url: String,
    pub pushed_at: EventTimestamp,
}

impl PushEvent {
    /// True when the pushed ref is the repository's default branch.
    pub fn is_default_branch(&self) -> bool {
        self.ref_name
            .strip_prefix("refs/heads/")
            .is_some_and(|branch| branch == self.default_branch)
    }
}

/// Action performed on a pull request.
///
/// Only the actions the dispatcher distinguishes are modeled; anything
/// else is dropped by the parser before an event is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrAction {
    Opened,
    Reopened,
    /// PR head was updated (new commits pushed).
    Synchronize,
    Closed,
    Edited,
}

impl PrAction {
    /// True for the actions that change the head commit or (re)open the
    /// PR, the only ones worth re-verifying.
    pub fn is_actionable(&self) -> bool {
        matches!(
            self,
            PrAction::Opened | PrAction::Reopened | PrAction::Synchronize
        )
    }
}

/// A pull request event.
#[derive(Debug, Clone, PartialEq)]
pub struct PullRequestEvent {
    pub action: PrAction,
    pub base_sha: Sha,
    pub head_sha: Sha,
    pub clone_url: String,
    pub statuses_url: String,
    pub updated_at: EventTimestamp,
}

/// A comment on an issue or pull request.
///
/// GitHub delivers PR conversation comments as `issue_comment` events;
/// `pull_request_url` is absent when the comment is on a plain issue.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueCommentEvent {
    pub body: String,
    pub pull_request_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_timestamp_converts_to_iso() {
        let ts = EventTimestamp::Epoch(1_620_000_000);
        assert_eq!(ts.to_iso8601(), "2021-05-03T00:00:00+00:00");
    }

    #[test]
    fn text_timestamp_passes_through() {
        let ts = EventTimestamp::Text("2021-05-01T12:00:00Z".to_string());
        assert_eq!(ts.to_iso8601(), "2021-05-01T12:00:00Z");
    }

    #[test]
    fn timestamp_deserializes_both_forms() {
        let epoch: EventTimestamp = serde_json::from_str("1620000000").unwrap();
        assert_eq!(epoch, EventTimestamp::Epoch(1_620_000_000));

        let text: EventTimestamp = serde_json::from_str("\"2021-05-01T12:00:00Z\"").unwrap();
        assert_eq!(text, EventTimestamp::Text("2021-05-01T12:00:00Z".to_string()));
    }

    #[test]
    fn default_branch_check() {
        let event = PushEvent {
            ref_name: "refs/heads/main".to_string(),
            before: Sha::new("a".repeat(40)),
            after: Sha::new("b".repeat(40)),
            clone_url: "https://github.com/ebay/thing.git".to_string(),
            default_branch: "main".to_string(),
            statuses_url: "https://example/statuses/{sha}".to_string(),
            pushed_at: EventTimestamp::Epoch(0),
        };
        assert!(event.is_default_branch());

        let feature = PushEvent {
            ref_name: "refs/heads/feature".to_string(),
            ..event.clone()
        };
        assert!(!feature.is_default_branch());

        // Tag pushes never count as the default branch.
        let tag = PushEvent {
            ref_name: "refs/tags/v1.0".to_string(),
            ..event
        };
        assert!(!tag.is_default_branch());
    }

    #[test]
    fn actionable_pr_actions() {
        assert!(PrAction::Opened.is_actionable());
        assert!(PrAction::Reopened.is_actionable());
        assert!(PrAction::Synchronize.is_actionable());
        assert!(!PrAction::Closed.is_actionable());
        assert!(!PrAction::Edited.is_actionable());
    }
}
