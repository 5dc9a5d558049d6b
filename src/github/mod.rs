//! GitHub API access.
//!
//! Every endpoint this service talks to arrives as an absolute URL from a
//! webhook payload: the `statuses_url` template (`.../statuses/{sha}`)
//! and the pull-request API URL. [`GithubApi`] is the seam the dispatcher
//! sees; [`GithubClient`] is the reqwest-backed implementation, and tests
//! substitute in-memory recorders.

pub mod client;
pub mod credentials;

pub use client::GithubClient;
pub use credentials::Credentials;

use std::future::Future;

use serde::Deserialize;
use thiserror::Error;

use crate::status::StatusReport;
use crate::types::Sha;

/// Errors from GitHub API calls.
#[derive(Debug, Error)]
pub enum GithubError {
    /// Transport-level failure (connect, timeout, TLS).
    #[error("github request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered outside the 2xx range.
    #[error("github answered {status} for {url}")]
    UnexpectedStatus { status: u16, url: String },
}

/// Result type for GitHub API calls.
pub type GithubResult<T> = Result<T, GithubError>;

/// A pull request as fetched from the API, reduced to the fields the
/// dispatcher needs to build a commit range.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestInfo {
    pub base: PrRef,
    pub head: PrHead,
    pub updated_at: String,
}

/// The base side of a pull request.
#[derive(Debug, Clone, Deserialize)]
pub struct PrRef {
    pub sha: Sha,
}

/// The head side of a pull request, carrying its repository.
#[derive(Debug, Clone, Deserialize)]
pub struct PrHead {
    pub sha: Sha,
    pub repo: PrRepo,
}

/// The repository a pull-request head lives in.
#[derive(Debug, Clone, Deserialize)]
pub struct PrRepo {
    pub clone_url: String,
    pub statuses_url: String,
}

/// The GitHub operations the dispatcher depends on.
///
/// Implementations are expected to be cheap to share (`&self` methods);
/// tests provide recording fakes.
pub trait GithubApi: Send + Sync {
    /// Substitutes `{sha}` into the statuses URL template and POSTs the
    /// commit-status body.
    fn post_status(
        &self,
        statuses_url: &str,
        report: &StatusReport,
    ) -> impl Future<Output = GithubResult<()>> + Send;

    /// Fetches a pull request by its API URL.
    fn get_pull_request(
        &self,
        url: &str,
    ) -> impl Future<Output = GithubResult<PullRequestInfo>> + Send;
}
