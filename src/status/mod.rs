//! Commit-status reporting.
//!
//! Every dispatched rule gets its own status context under the service's
//! namespace (`change-relay/<rule>`), plus one umbrella context for the
//! service itself, so the GitHub UI shows one overall check and N
//! per-rule checks per commit.

use serde::{Deserialize, Serialize};
use std::fmt;

use tracing::{debug, warn};

use crate::github::GithubApi;
use crate::types::{RepoId, Sha};
use crate::SERVICE_NAME;

/// State of a commit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusState {
    /// Check is pending.
    Pending,
    /// Check succeeded.
    Success,
    /// Check failed.
    Failure,
    /// Check errored.
    Error,
}

impl fmt::Display for StatusState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StatusState::Pending => "pending",
            StatusState::Success => "success",
            StatusState::Failure => "failure",
            StatusState::Error => "error",
        };
        write!(f, "{s}")
    }
}

/// The commit-status request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub owner: String,
    pub repo: String,
    pub sha: Sha,
    pub state: StatusState,
    pub context: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Posts commit statuses for one commit range.
///
/// Bound to a single repo, head SHA, and statuses URL; each method posts
/// one status for the named rule (or for the service itself when called
/// with [`SERVICE_NAME`]).
pub struct Reporter<'a, G> {
    github: &'a G,
    repo: RepoId,
    sha: Sha,
    statuses_url: String,
}

impl<'a, G: GithubApi> Reporter<'a, G> {
    pub fn new(github: &'a G, repo: RepoId, sha: Sha, statuses_url: impl Into<String>) -> Self {
        Reporter {
            github,
            repo,
            sha,
            statuses_url: statuses_url.into(),
        }
    }

    pub async fn pending(&self, rule: &str) {
        self.post(rule, StatusState::Pending, None).await;
    }

    pub async fn ok(&self, rule: &str) {
        self.post(rule, StatusState::Success, None).await;
    }

    pub async fn fail(&self, rule: &str, message: impl Into<String>) {
        self.post(rule, StatusState::Failure, Some(message.into()))
            .await;
    }

    pub async fn error(&self, rule: &str, message: impl Into<String>) {
        self.post(rule, StatusState::Error, Some(message.into()))
            .await;
    }

    /// Builds and posts one status. A failed post is logged and
    /// swallowed: losing an observability update must not abort the rule
    /// or the event it belongs to.
    async fn post(&self, rule: &str, state: StatusState, description: Option<String>) {
        let report = StatusReport {
            owner: self.repo.owner.clone(),
            repo: self.repo.repo.clone(),
            sha: self.sha.clone(),
            state,
            context: format!("{SERVICE_NAME}/{rule}"),
            description,
        };

        debug!(
            repo = %self.repo,
            sha = %self.sha.short(),
            state = %state,
            rule = %rule,
            "reporting commit status"
        );

        if let Err(e) = self.github.post_status(&self.statuses_url, &report).await {
            warn!(
                repo = %self.repo,
                rule = %rule,
                error = %e,
                "failed to report commit status"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::{GithubResult, PullRequestInfo};
    use std::sync::Mutex;

    /// Records every status body it is handed.
    struct RecordingGithub {
        statuses: Mutex<Vec<(String, StatusReport)>>,
    }

    impl RecordingGithub {
        fn new() -> Self {
            RecordingGithub {
                statuses: Mutex::new(Vec::new()),
            }
        }

        fn reports(&self) -> Vec<(String, StatusReport)> {
            self.statuses.lock().unwrap().clone()
        }
    }

    impl GithubApi for RecordingGithub {
        async fn post_status(&self, url: &str, report: &StatusReport) -> GithubResult<()> {
            self.statuses
                .lock()
                .unwrap()
                .push((url.to_string(), report.clone()));
            Ok(())
        }

        async fn get_pull_request(&self, _url: &str) -> GithubResult<PullRequestInfo> {
            unreachable!("reporter never fetches pull requests")
        }
    }

    fn reporter(github: &RecordingGithub) -> Reporter<'_, RecordingGithub> {
        Reporter::new(
            github,
            RepoId::new("ebay", "thing"),
            Sha::new("a".repeat(40)),
            "https://api.github.com/repos/ebay/thing/statuses/{sha}",
        )
    }

    #[tokio::test]
    async fn pending_posts_without_description() {
        let github = RecordingGithub::new();
        reporter(&github).pending("alarms").await;

        let reports = github.reports();
        assert_eq!(reports.len(), 1);
        let (url, report) = &reports[0];
        assert_eq!(url, "https://api.github.com/repos/ebay/thing/statuses/{sha}");
        assert_eq!(report.state, StatusState::Pending);
        assert_eq!(report.context, "change-relay/alarms");
        assert_eq!(report.owner, "ebay");
        assert_eq!(report.repo, "thing");
        assert!(report.description.is_none());
    }

    #[tokio::test]
    async fn fail_attaches_description() {
        let github = RecordingGithub::new();
        reporter(&github).fail("alarms", "bad request").await;

        let report = &github.reports()[0].1;
        assert_eq!(report.state, StatusState::Failure);
        assert_eq!(report.description.as_deref(), Some("bad request"));
    }

    #[tokio::test]
    async fn umbrella_context_uses_service_name_twice() {
        let github = RecordingGithub::new();
        reporter(&github).ok(SERVICE_NAME).await;

        let report = &github.reports()[0].1;
        assert_eq!(report.context, "change-relay/change-relay");
        assert_eq!(report.state, StatusState::Success);
    }

    #[test]
    fn states_serialize_snake_case() {
        assert_eq!(
            serde_json::to_string(&StatusState::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::to_string(&StatusState::Failure).unwrap(),
            "\"failure\""
        );
    }

    #[test]
    fn description_is_omitted_when_absent() {
        let report = StatusReport {
            owner: "ebay".into(),
            repo: "thing".into(),
            sha: Sha::new("a".repeat(40)),
            state: StatusState::Success,
            context: "change-relay/alarms".into(),
            description: None,
        };
        let value = serde_json::to_value(&report).unwrap();
        assert!(value.get("description").is_none());
    }
}
