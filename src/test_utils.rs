//! Shared test fixtures.
//!
//! Builds real local git repositories so CommitRange and dispatcher tests
//! exercise actual clones and diffs instead of mocked git.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::git::run_git;
use crate::types::Sha;

/// Initialize an empty repository with a test identity and `main` as the
/// initial branch.
pub fn init_repo(dir: &Path) {
    run_git(dir, &["init", "--initial-branch=main"]).unwrap();
    run_git(dir, &["config", "user.email", "test@test.invalid"]).unwrap();
    run_git(dir, &["config", "user.name", "Test"]).unwrap();
}

/// Write `files` into the work tree and commit them, returning the new
/// commit's SHA.
pub fn commit_files(dir: &Path, files: &[(&str, &str)], message: &str) -> Sha {
    for (path, contents) in files {
        let full = dir.join(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(full, contents).unwrap();
    }
    run_git(dir, &["add", "."]).unwrap();
    run_git(dir, &["commit", "-m", message]).unwrap();
    head_sha(dir)
}

/// The current HEAD commit.
pub fn head_sha(dir: &Path) -> Sha {
    let out = run_git(dir, &["rev-parse", "HEAD"]).unwrap();
    Sha::new(String::from_utf8_lossy(&out.stdout).trim().to_string())
}

/// A local "remote" repository with committed history, suitable as a
/// CommitRange clone source.
pub struct FixtureRepo {
    // Held for cleanup; the repository lives inside it.
    _dir: TempDir,
    pub path: PathBuf,
}

impl FixtureRepo {
    /// Create a repository containing one initial commit with `files`.
    pub fn new(files: &[(&str, &str)]) -> (Self, Sha) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fixture");
        std::fs::create_dir(&path).unwrap();
        init_repo(&path);
        let sha = commit_files(&path, files, "initial");
        (
            FixtureRepo {
                _dir: dir,
                path,
            },
            sha,
        )
    }

    /// Add a commit on top of the current HEAD.
    pub fn commit(&self, files: &[(&str, &str)], message: &str) -> Sha {
        commit_files(&self.path, files, message)
    }

    /// Commit a rename of `from` to `to`.
    pub fn commit_rename(&self, from: &str, to: &str) -> Sha {
        run_git(&self.path, &["mv", from, to]).unwrap();
        run_git(&self.path, &["commit", "-m", "rename"]).unwrap();
        head_sha(&self.path)
    }

    /// The repository path as a clone URL.
    pub fn clone_url(&self) -> String {
        self.path.display().to_string()
    }
}
