//! GitHub webhook events and parsing.
//!
//! The front door hands [`parse_webhook`] the `X-GitHub-Event` header
//! value and the raw JSON body; it returns a typed event for the three
//! names this service handles, `None` for everything else. The mapping
//! from event name to parser is explicit, so "is this event handled?" is
//! answerable without constructing anything.

pub mod events;
pub mod parser;

pub use events::{EventTimestamp, IssueCommentEvent, PrAction, PullRequestEvent, PushEvent};
pub use parser::{parse_webhook, ParseError};

/// The webhook event names this service registers handlers for.
pub const SUPPORTED_EVENTS: &[&str] = &["push", "pull_request", "issue_comment"];

/// True when a handler is registered for the event name.
pub fn is_supported_event(event_name: &str) -> bool {
    SUPPORTED_EVENTS.contains(&event_name)
}

/// A parsed webhook event.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookEvent {
    Push(PushEvent),
    PullRequest(PullRequestEvent),
    IssueComment(IssueCommentEvent),
}
