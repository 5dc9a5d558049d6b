//! Newtype wrappers for domain identifiers.
//!
//! These types prevent accidental mixing of identifiers (e.g. using a
//! commit SHA where an owner/repo pair is expected) and make the code
//! more self-documenting.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A git commit SHA (40 hex characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sha(pub String);

/// The sentinel GitHub sends in place of a commit id when a branch is
/// created or deleted.
const ZERO_SHA: &str = "0000000000000000000000000000000000000000";

impl Sha {
    /// Creates a new Sha from a string.
    ///
    /// Note: this does not validate the format. Valid SHAs are 40 hex
    /// characters.
    pub fn new(s: impl Into<String>) -> Self {
        Sha(s.into())
    }

    /// Returns the SHA as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns a short (7-character) version of the SHA for display.
    pub fn short(&self) -> &str {
        self.0.get(..7).unwrap_or(&self.0)
    }

    /// True when this is the all-zero sentinel, meaning the commit does
    /// not exist (branch creation or deletion).
    pub fn is_zero(&self) -> bool {
        self.0 == ZERO_SHA
    }
}

impl fmt::Display for Sha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Sha {
    fn from(s: String) -> Self {
        Sha(s)
    }
}

impl From<&str> for Sha {
    fn from(s: &str) -> Self {
        Sha(s.to_string())
    }
}

/// A clone URL whose path does not contain an owner and repo segment.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("cannot derive owner/repo from clone url: {0}")]
pub struct InvalidCloneUrl(pub String);

/// A repository identifier (owner/repo format).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    pub owner: String,
    pub repo: String,
}

impl RepoId {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        RepoId {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Derives the owner and repo from a clone URL.
    ///
    /// The owner and repo are the second and third path segments; a
    /// trailing `.git` suffix on the repo segment is stripped.
    ///
    /// ```
    /// use change_relay::types::RepoId;
    ///
    /// let id = RepoId::from_clone_url("https://github.com/ebay/thing.git").unwrap();
    /// assert_eq!(id, RepoId::new("ebay", "thing"));
    /// ```
    pub fn from_clone_url(url: &str) -> Result<RepoId, InvalidCloneUrl> {
        // Skip "scheme://host" when present; what remains starts with
        // the path, leading slash included.
        let path = match url.find("://") {
            Some(scheme_end) => {
                let after_scheme = &url[scheme_end + 3..];
                match after_scheme.find('/') {
                    Some(host_end) => &after_scheme[host_end..],
                    None => return Err(InvalidCloneUrl(url.to_string())),
                }
            }
            None => url,
        };

        let mut segments = path.split('/');
        // The path starts with '/', so the first segment is empty.
        let _ = segments.next();
        let owner = segments.next().filter(|s| !s.is_empty());
        let repo = segments.next().filter(|s| !s.is_empty());

        match (owner, repo) {
            (Some(owner), Some(repo)) => Ok(RepoId::new(
                owner,
                repo.strip_suffix(".git").unwrap_or(repo),
            )),
            _ => Err(InvalidCloneUrl(url.to_string())),
        }
    }

    /// The `owner_repo` pair joined with an underscore, used as the
    /// outbound payload's application identifier.
    pub fn app_id(&self) -> String {
        format!("{}_{}", self.owner, self.repo)
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// If the string ends with `.git`, remove that.
///
/// Applied to repository URLs before they are echoed outward in payloads.
pub fn prune_dotgit_suffix(url: &str) -> &str {
    url.strip_suffix(".git").unwrap_or(url)
}
