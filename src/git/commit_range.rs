//! A commit range within a single repository.
//!
//! A [`CommitRange`] wraps a repository URL and a (start, end) commit
//! pair. The local clone backing `files_changed` and
//! `file_contents_at_head` is created lazily in a temporary directory on
//! first use, shared by both operations, and removed when the range is
//! dropped. Ranges are built per inbound event and never reused.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::OnceLock;

use tempfile::TempDir;
use tracing::{debug, info};

use crate::github::Credentials;
use crate::types::{RepoId, Sha};

use super::{git_command, run_git, rev_parse, GitError, GitResult, EMPTY_TREE_SHA};

/// A lazily-created local clone. Dropping it removes the directory.
struct ClonedRepo {
    dir: TempDir,
}

impl ClonedRepo {
    fn create(repo_url: &str, credentials: &Credentials) -> GitResult<ClonedRepo> {
        let dir = TempDir::new()?;
        info!(url = %repo_url, "cloning repository");

        // Auth happens on the URL handed to git so the bare repo URL is
        // all that ever reaches logs or downstream systems.
        let authed = credentials.authenticated_clone_url(repo_url);
        // TODO: shallower clone; full history is more than the diff needs.
        let output = git_command(dir.path())
            .args(["clone", authed.as_str(), "."])
            .output()?;

        if !output.status.success() {
            return Err(GitError::CloneFailed {
                url: repo_url.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        Ok(ClonedRepo { dir })
    }

    fn workdir(&self) -> &Path {
        self.dir.path()
    }
}

/// A (repository, start commit, end commit) triple.
pub struct CommitRange {
    repo_url: String,
    /// `None` when the event carried the all-zero sentinel: the range
    /// covers a newly created branch with no prior commit.
    start: Option<Sha>,
    end: Sha,
    credentials: Credentials,
    clone: OnceLock<ClonedRepo>,
}

impl CommitRange {
    /// Builds a range. A `start` equal to the all-zero sentinel is
    /// recorded as absent; the diff baseline becomes the empty tree.
    pub fn new(
        repo_url: impl Into<String>,
        start: Sha,
        end: Sha,
        credentials: Credentials,
    ) -> Self {
        CommitRange {
            repo_url: repo_url.into(),
            start: (!start.is_zero()).then_some(start),
            end,
            credentials,
            clone: OnceLock::new(),
        }
    }

    /// The repository URL as received from the event, credential-free.
    pub fn repo_url(&self) -> &str {
        &self.repo_url
    }

    /// The owner and repo derived from the URL's path segments.
    pub fn owner_repo(&self) -> GitResult<RepoId> {
        Ok(RepoId::from_clone_url(&self.repo_url)?)
    }

    /// The end commit of the range.
    pub fn head_sha(&self) -> &Sha {
        &self.end
    }

    /// Clones the repository on first access; both range operations share
    /// the one clone.
    fn repo(&self) -> GitResult<&Path> {
        if let Some(cloned) = self.clone.get() {
            return Ok(cloned.workdir());
        }
        let cloned = ClonedRepo::create(&self.repo_url, &self.credentials)?;
        // Ranges are processed on a single flow; a lost race here would
        // only drop the extra clone's directory.
        Ok(self.clone.get_or_init(|| cloned).workdir())
    }

    /// The set of file paths that differ between the start and end
    /// commits.
    ///
    /// Renames and copies contribute both the old and the new name: a
    /// rule watching either side of a rename should still fire.
    pub fn files_changed(&self) -> GitResult<BTreeSet<String>> {
        let workdir = self.repo()?;

        let base = match &self.start {
            Some(start) => rev_parse(workdir, start.as_str())?,
            // New branch: diff against the well-known empty tree.
            None => Sha::new(EMPTY_TREE_SHA),
        };
        let head = rev_parse(workdir, self.end.as_str())?;

        let output = run_git(
            workdir,
            &[
                "diff",
                "--name-status",
                "--find-renames",
                base.as_str(),
                head.as_str(),
            ],
        )?;
        let text = String::from_utf8_lossy(&output.stdout);

        let mut changed = BTreeSet::new();
        for line in text.lines() {
            let mut fields = line.split('\t');
            let Some(status) = fields.next() else {
                continue;
            };
            // Rename/copy rows carry two paths; everything else one.
            match status.chars().next() {
                Some('R') | Some('C') => {
                    for path in fields.take(2) {
                        changed.insert(path.to_string());
                    }
                }
                Some(_) => {
                    if let Some(path) = fields.next() {
                        changed.insert(path.to_string());
                    }
                }
                None => {}
            }
        }

        debug!(
            head = %self.end.short(),
            files = changed.len(),
            "computed changed files"
        );
        Ok(changed)
    }

    /// Reads each requested path's blob at the end commit, decoded as
    /// UTF-8 text.
    ///
    /// A path that does not exist at that commit is an error, never a
    /// silent omission.
    pub fn file_contents_at_head(
        &self,
        paths: &BTreeSet<String>,
    ) -> GitResult<BTreeMap<String, String>> {
        let workdir = self.repo()?;

        let mut contents = BTreeMap::new();
        for path in paths {
            let spec = format!("{}:{}", self.end.as_str(), path);
            let output = match run_git(workdir, &["show", &spec]) {
                Ok(output) => output,
                Err(GitError::CommandFailed { .. }) => {
                    return Err(GitError::FileNotFound {
                        path: path.clone(),
                        sha: self.end.clone(),
                    });
                }
                Err(e) => return Err(e),
            };
            let text = String::from_utf8(output.stdout).map_err(|_| GitError::NotUtf8 {
                path: path.clone(),
                sha: self.end.clone(),
            })?;
            contents.insert(path.clone(), text);
        }
        Ok(contents)
    }
}

impl std::fmt::Debug for CommitRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommitRange")
            .field("repo_url", &self.repo_url)
            .field("start", &self.start)
            .field("end", &self.end)
            .field("cloned", &self.clone.get().is_some())
            .finish()
    }
}
