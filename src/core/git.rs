//! Git introspection via the `git` CLI.
//!
//! Conveyor only needs three facts from git: the current branch (for trigger
//! events), the repository root (config discovery, log placement) and the
//! `.git` directory (hook installation). All are read by shelling out, so
//! there is no libgit dependency to carry.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Error, Result};

fn git_stdout(dir: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if stdout.is_empty() {
        None
    } else {
        Some(stdout)
    }
}

/// Current branch name, or `None` outside a repository or on a detached
/// HEAD (where `rev-parse --abbrev-ref` answers the literal `HEAD`).
pub fn current_branch(dir: &Path) -> Option<String> {
    git_stdout(dir, &["rev-parse", "--abbrev-ref", "HEAD"]).filter(|name| name != "HEAD")
}

/// Root of the repository working tree containing `dir`.
pub fn repo_root(dir: &Path) -> Option<PathBuf> {
    git_stdout(dir, &["rev-parse", "--show-toplevel"]).map(PathBuf::from)
}

/// Absolute path of the `.git` directory, required for hook installation.
pub fn git_dir(dir: &Path) -> Result<PathBuf> {
    git_stdout(dir, &["rev-parse", "--absolute-git-dir"])
        .map(PathBuf::from)
        .ok_or_else(|| Error::Git(format!("not a git repository: {}", dir.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_repo_dir_has_no_branch() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(current_branch(dir.path()), None);
        assert!(repo_root(dir.path()).is_none());
    }

    #[test]
    fn git_dir_errors_outside_repository() {
        let dir = tempfile::tempdir().unwrap();
        let err = git_dir(dir.path()).unwrap_err();
        assert_eq!(err.code(), "GIT_ERROR");
    }

    #[test]
    fn repo_root_found_after_init() {
        let dir = tempfile::tempdir().unwrap();
        let status = Command::new("git")
            .args(["init", "--quiet"])
            .current_dir(dir.path())
            .status();
        if !status.map(|s| s.success()).unwrap_or(false) {
            return; // git unavailable in this environment
        }
        let root = repo_root(dir.path()).unwrap();
        assert_eq!(
            root.canonicalize().unwrap(),
            dir.path().canonicalize().unwrap()
        );
    }
}
