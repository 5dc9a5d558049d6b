//! Process-level git plumbing.
//!
//! All repository access shells out to the `git` binary with a clean
//! environment, so behavior does not depend on system or user git
//! configuration. The only consumer is [`CommitRange`], which clones a
//! repository into a temporary directory, diffs a commit pair, and reads
//! blobs at the head commit.

pub mod commit_range;

pub use commit_range::CommitRange;

use std::path::Path;
use std::process::Output;

use thiserror::Error;

use crate::types::{InvalidCloneUrl, Sha};

/// Git's well-known empty tree object id, used as the diff baseline when
/// a commit range starts at the branch-creation sentinel and there is no
/// prior commit to diff against.
pub const EMPTY_TREE_SHA: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";

/// Errors from git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Cloning the remote failed. Carries the credential-free URL only.
    #[error("failed to clone {url}: {stderr}")]
    CloneFailed { url: String, stderr: String },

    /// A commit id could not be resolved in the clone.
    #[error("cannot resolve revision {rev}")]
    RevisionNotFound { rev: String },

    /// A requested path does not exist at the given commit.
    #[error("file {path} not found at commit {sha}")]
    FileNotFound { path: String, sha: Sha },

    /// A blob's contents are not valid UTF-8 text.
    #[error("file {path} at commit {sha} is not valid UTF-8")]
    NotUtf8 { path: String, sha: Sha },

    /// Git command failed.
    #[error("git command failed: {command}\nstderr: {stderr}")]
    CommandFailed { command: String, stderr: String },

    /// The repository URL has no owner/repo path segments.
    #[error(transparent)]
    InvalidUrl(#[from] InvalidCloneUrl),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for git operations.
pub type GitResult<T> = Result<T, GitError>;

/// Create a git Command with a clean environment (no system/user config).
///
/// This ensures consistent behavior across machines by ignoring system
/// and user git configuration, and disables terminal credential prompts
/// so a misconfigured clone fails instead of hanging.
pub(crate) fn git_command(workdir: &Path) -> std::process::Command {
    use std::process::Command;

    let mut cmd = Command::new("git");
    cmd.current_dir(workdir);

    cmd.env("GIT_CONFIG_NOSYSTEM", "1");
    cmd.env("GIT_CONFIG_GLOBAL", "/dev/null");
    cmd.env("GIT_TERMINAL_PROMPT", "0");

    // Abort stalled transfers (under 1 KB/s for a minute) instead of
    // hanging an event's dispatch on a dead remote.
    cmd.env("GIT_HTTP_LOW_SPEED_LIMIT", "1000");
    cmd.env("GIT_HTTP_LOW_SPEED_TIME", "60");

    cmd
}

/// Run a git command in the given working directory.
///
/// Returns the command output on success, or a [`GitError`] carrying the
/// command line and stderr on failure.
pub fn run_git(workdir: &Path, args: &[&str]) -> GitResult<Output> {
    let output = git_command(workdir).args(args).output()?;

    if output.status.success() {
        Ok(output)
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let command = format!("git {}", args.join(" "));
        Err(GitError::CommandFailed { command, stderr })
    }
}

/// Run a git command and return stdout as a trimmed string.
pub fn run_git_stdout(workdir: &Path, args: &[&str]) -> GitResult<String> {
    let output = run_git(workdir, args)?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Resolve a revision to a full SHA, distinguishing "unknown revision"
/// from other failures.
pub fn rev_parse(workdir: &Path, rev: &str) -> GitResult<Sha> {
    match run_git_stdout(workdir, &["rev-parse", "--verify", &format!("{rev}^{{commit}}")]) {
        Ok(sha) => Ok(Sha::new(sha)),
        Err(GitError::CommandFailed { .. }) => Err(GitError::RevisionNotFound {
            rev: rev.to_string(),
        }),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::init_repo;
    use tempfile::tempdir;

    #[test]
    fn run_git_reports_failed_command() {
        let dir = tempdir().unwrap();
        let err = run_git(dir.path(), &["rev-parse", "HEAD"]).unwrap_err();
        match err {
            GitError::CommandFailed { command, .. } => {
                assert_eq!(command, "git rev-parse HEAD");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rev_parse_resolves_head() {
        let dir = tempdir().unwrap();
        init_repo(dir.path());
        std::fs::write(dir.path().join("a.txt"), "a\n").unwrap();
        run_git(dir.path(), &["add", "."]).unwrap();
        run_git(dir.path(), &["commit", "-m", "initial"]).unwrap();

        let sha = rev_parse(dir.path(), "HEAD").unwrap();
        assert_eq!(sha.as_str().len(), 40);
    }

    #[test]
    fn rev_parse_unknown_revision() {
        let dir = tempdir().unwrap();
        init_repo(dir.path());

        let err = rev_parse(dir.path(), "deadbeef").unwrap_err();
        assert!(matches!(err, GitError::RevisionNotFound { .. }));
    }
}
