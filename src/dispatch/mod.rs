//! Event dispatch.
//!
//! [`Processor`] is the orchestrator: it turns a typed webhook event into
//! a [`CommitRange`], evaluates every routing rule against the changed
//! file set, forwards matching files downstream, and drives commit-status
//! reporting. One event is processed start to finish; concurrent events
//! are independent and share nothing mutable.
//!
//! Git work (clone, diff, blob reads) is synchronous and runs on the
//! blocking pool; per-rule HTTP calls stay on the async runtime.

pub mod payload;
pub mod service;

pub use payload::{OutboundPayload, OutboundType};
pub use service::{HttpServiceCaller, ServiceCaller, ServiceError, ServiceResponse};

use std::collections::BTreeSet;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::commands::parse_retest;
use crate::git::{CommitRange, GitError};
use crate::github::{Credentials, GithubApi, GithubError};
use crate::routing::RouteRule;
use crate::status::Reporter;
use crate::types::RepoId;
use crate::webhooks::{EventTimestamp, IssueCommentEvent, PullRequestEvent, PushEvent};
use crate::SERVICE_NAME;

/// Errors that abort processing of an entire event.
///
/// Per-rule failures (downstream HTTP errors, files missing at the head
/// commit) are not here: those are isolated to the rule and surface as
/// commit statuses.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Clone or commit resolution failed; nothing was dispatched.
    #[error(transparent)]
    Git(#[from] GitError),

    /// A GitHub API lookup the event depends on failed.
    #[error(transparent)]
    Github(#[from] GithubError),

    /// A blocking git task was cancelled or panicked.
    #[error("git task failed: {0}")]
    GitTask(String),
}

/// Result of processing one event: did any rule match?
pub type DispatchResult = Result<bool, DispatchError>;

/// Orchestrates rule evaluation for inbound events.
///
/// Generic over the GitHub seam and the downstream-service seam so tests
/// can substitute recording fakes for both.
pub struct Processor<G, S> {
    rules: Vec<RouteRule>,
    github: G,
    services: S,
    credentials: Credentials,
}

impl<G: GithubApi, S: ServiceCaller> Processor<G, S> {
    pub fn new(rules: Vec<RouteRule>, github: G, services: S, credentials: Credentials) -> Self {
        Processor {
            rules,
            github,
            services,
            credentials,
        }
    }

    /// Handles a push event.
    ///
    /// Branch deletions (all-zero `after`) and pushes to anything but the
    /// repository's default branch are ignored.
    pub async fn process_push(&self, event: PushEvent) -> DispatchResult {
        info!(git_ref = %event.ref_name, "processing a push");

        if event.after.is_zero() {
            // Push to delete a branch.
            return Ok(false);
        }
        if !event.is_default_branch() {
            debug!(
                git_ref = %event.ref_name,
                default_branch = %event.default_branch,
                "ignoring push to non-default branch"
            );
            return Ok(false);
        }

        let range = CommitRange::new(
            event.clone_url,
            event.before,
            event.after,
            self.credentials.clone(),
        );

        self.send_update(
            range,
            OutboundType::Commit,
            // NB: pushed_at, not updated_at; updated_at moves on
            // metadata-only changes.
            event.pushed_at,
            &event.statuses_url,
            None,
        )
        .await
    }

    /// Handles a pull-request event for the opened/reopened/synchronize
    /// actions; everything else is ignored.
    pub async fn process_pull_request(&self, event: PullRequestEvent) -> DispatchResult {
        if !event.action.is_actionable() {
            return Ok(false);
        }

        let range = CommitRange::new(
            event.clone_url,
            event.base_sha,
            event.head_sha,
            self.credentials.clone(),
        );

        self.send_update(
            range,
            OutboundType::Verify,
            event.updated_at,
            &event.statuses_url,
            None,
        )
        .await
    }

    /// Handles an issue comment: a `retest` command on a pull request
    /// re-runs verification, optionally restricted to one named rule.
    pub async fn process_issue_comment(&self, event: IssueCommentEvent) -> DispatchResult {
        // Comments on plain issues have nothing to retest.
        let Some(pr_url) = event.pull_request_url else {
            return Ok(false);
        };
        let Some(command) = parse_retest(&event.body, SERVICE_NAME) else {
            return Ok(false);
        };

        info!(pr = %pr_url, only_rule = ?command.only_rule, "processing a retest");
        let pr = self.github.get_pull_request(&pr_url).await?;

        let range = CommitRange::new(
            pr.head.repo.clone_url,
            pr.base.sha,
            pr.head.sha,
            self.credentials.clone(),
        );

        self.send_update(
            range,
            OutboundType::Verify,
            EventTimestamp::Text(pr.updated_at),
            &pr.head.repo.statuses_url,
            command.only_rule.as_deref(),
        )
        .await
    }

    /// The shared orchestration.
    ///
    /// Computes the changed file set once, then walks the rules in
    /// configured order: every rule with a non-empty match gets a pending
    /// status, a payload POST, and a final status classified from the
    /// response. The umbrella status goes to success after all rules
    /// regardless of their outcomes; it records that the dispatcher ran,
    /// not that every rule passed.
    async fn send_update(
        &self,
        range: CommitRange,
        outbound_type: OutboundType,
        timestamp: EventTimestamp,
        statuses_url: &str,
        only_run: Option<&str>,
    ) -> DispatchResult {
        let repo = range.owner_repo()?;
        let head_sha = range.head_sha().clone();
        let range = Arc::new(range);

        let relevant = run_git_task({
            let range = Arc::clone(&range);
            move || range.files_changed()
        })
        .await??;
        debug!(repo = %repo, files = relevant.len(), "changed files computed");

        let reporter = Reporter::new(&self.github, repo.clone(), head_sha.clone(), statuses_url);
        reporter.pending(SERVICE_NAME).await;

        let mut found_match = false;
        for rule in &self.rules {
            if only_run.is_some_and(|only| only != rule.name) {
                continue;
            }
            let matches = rule.return_matches(&relevant);
            if matches.is_empty() {
                continue;
            }
            found_match = true;

            reporter.pending(&rule.name).await;
            self.dispatch_rule(rule, matches, &range, &repo, &timestamp, outbound_type, &reporter)
                .await;
        }

        reporter.ok(SERVICE_NAME).await;
        Ok(found_match)
    }

    /// Runs one matching rule to completion: content fetch, POST,
    /// response classification. Failures are reported as that rule's
    /// status and never escape, so one broken rule cannot starve the
    /// rules after it.
    #[allow(clippy::too_many_arguments)]
    async fn dispatch_rule(
        &self,
        rule: &RouteRule,
        matches: BTreeSet<String>,
        range: &Arc<CommitRange>,
        repo: &RepoId,
        timestamp: &EventTimestamp,
        outbound_type: OutboundType,
        reporter: &Reporter<'_, G>,
    ) {
        let contents = run_git_task({
            let range = Arc::clone(range);
            move || range.file_contents_at_head(&matches)
        })
        .await;

        let contents = match contents {
            Ok(Ok(contents)) => contents,
            Ok(Err(e)) => {
                warn!(rule = %rule.name, error = %e, "content fetch failed");
                reporter.error(&rule.name, e.to_string()).await;
                return;
            }
            Err(e) => {
                warn!(rule = %rule.name, error = %e, "git task failed");
                reporter.error(&rule.name, e.to_string()).await;
                return;
            }
        };

        let payload = OutboundPayload::build(
            repo,
            range.repo_url(),
            range.head_sha(),
            contents,
            timestamp,
            outbound_type,
        );

        info!(rule = %rule.name, url = %rule.url, files = payload.files.len(), "calling service");
        match self.services.call(&rule.url, &payload).await {
            Ok(response) if response.status < 400 => {
                reporter.ok(&rule.name).await;
            }
            Ok(response) if response.status < 500 => {
                warn!(rule = %rule.name, status = response.status, "service rejected payload");
                reporter.fail(&rule.name, response.body).await;
            }
            Ok(response) => {
                warn!(rule = %rule.name, status = response.status, "service errored");
                reporter.error(&rule.name, response.body).await;
            }
            Err(e) => {
                warn!(rule = %rule.name, error = %e, "service unreachable");
                reporter.error(&rule.name, e.to_string()).await;
            }
        }
    }
}

/// Runs a synchronous git closure on the blocking pool.
async fn run_git_task<T, F>(f: F) -> Result<T, DispatchError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| DispatchError::GitTask(e.to_string()))
}
