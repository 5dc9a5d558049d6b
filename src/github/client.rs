//! reqwest-backed GitHub client.

use std::time::Duration;

use tracing::debug;

use crate::status::StatusReport;

use super::{Credentials, GithubApi, GithubError, GithubResult, PullRequestInfo};

/// Bound on every GitHub round-trip.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A GitHub API client authenticating with the deployment's basic-auth
/// credentials. All endpoints are absolute URLs taken from webhook
/// payloads, so the client carries no base URL of its own.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    credentials: Credentials,
}

impl GithubClient {
    pub fn new(credentials: Credentials) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("change-relay/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("reqwest client construction cannot fail with static configuration");
        GithubClient { http, credentials }
    }

    fn authenticated(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.credentials.basic_auth() {
            Some((user, pass)) => req.basic_auth(user, Some(pass)),
            None => req,
        }
    }
}

impl GithubApi for GithubClient {
    async fn post_status(&self, statuses_url: &str, report: &StatusReport) -> GithubResult<()> {
        let url = statuses_url.replace("{sha}", report.sha.as_str());
        debug!(
            url = %url,
            state = %report.state,
            context = %report.context,
            "posting commit status"
        );

        let response = self
            .authenticated(self.http.post(&url))
            .json(report)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GithubError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }
        Ok(())
    }

    async fn get_pull_request(&self, url: &str) -> GithubResult<PullRequestInfo> {
        debug!(url = %url, "fetching pull request");

        let response = self.authenticated(self.http.get(url)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GithubError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::PullRequestInfo;

    #[test]
    fn pull_request_deserializes_needed_fields() {
        let body = serde_json::json!({
            "number": 42,
            "state": "open",
            "updated_at": "2021-05-01T12:00:00Z",
            "base": { "sha": "a".repeat(40), "ref": "main" },
            "head": {
                "sha": "b".repeat(40),
                "ref": "feature",
                "repo": {
                    "clone_url": "https://github.com/ebay/thing.git",
                    "statuses_url": "https://api.github.com/repos/ebay/thing/statuses/{sha}"
                }
            }
        });

        let pr: PullRequestInfo = serde_json::from_value(body).unwrap();
        assert_eq!(pr.base.sha.as_str(), "a".repeat(40));
        assert_eq!(pr.head.sha.as_str(), "b".repeat(40));
        assert_eq!(pr.head.repo.clone_url, "https://github.com/ebay/thing.git");
        assert_eq!(pr.updated_at, "2021-05-01T12:00:00Z");
    }
}
