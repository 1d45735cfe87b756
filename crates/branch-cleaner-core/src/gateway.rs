//! Version-control backend abstraction
//!
//! [`VcsGateway`] is the narrow surface the scanner needs. It holds no state
//! of its own: the checked-out branch lives in the repository, and every
//! method reads or mutates it directly. [`GitCli`] implements the trait by
//! shelling out to `git -C <repo>`.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tracing::{debug, warn};

use crate::error::CleanerError;
use crate::types::{CommitHash, RebaseOutcome};

/// Operations the redundancy scan performs against a repository
pub trait VcsGateway {
    /// Update all remote-tracking refs
    fn fetch_all(&self) -> Result<(), CleanerError>;

    /// Whether `refs/heads/<name>` resolves
    fn has_local_branch(&self, name: &str) -> bool;

    /// Whether `refs/remotes/<name>` resolves
    fn has_remote_branch(&self, name: &str) -> bool;

    /// Local branch names, lexically sorted
    fn local_branches(&self) -> Result<Vec<String>, CleanerError>;

    /// Whether tracked files are free of uncommitted changes
    fn is_working_tree_clean(&self) -> Result<bool, CleanerError>;

    /// Switch to `branch`, or create `new_branch` at `branch` and switch to that
    fn checkout(&self, branch: &str, new_branch: Option<&str>) -> Result<(), CleanerError>;

    /// Replay the current branch onto `onto`
    ///
    /// A conflict is an outcome, not an error. `Err` is reserved for
    /// failures that leave no rebase in progress.
    fn rebase(&self, onto: &str) -> Result<RebaseOutcome, CleanerError>;

    /// Restore the pre-rebase state; a no-op when no rebase is in progress
    fn abort_rebase(&self);

    /// Remove a local branch, merged or not
    ///
    /// A missing branch is an error, except with `force`, where it is success.
    fn delete_branch(&self, name: &str, force: bool) -> Result<(), CleanerError>;

    /// Hash of the checked-out commit, read fresh from the repository
    fn head_commit_hash(&self) -> Result<CommitHash, CleanerError>;
}

/// Git CLI wrapper rooted at a working copy
#[derive(Debug, Clone)]
pub struct GitCli {
    repo_root: PathBuf,
}

impl GitCli {
    /// Open the repository containing `path`
    ///
    /// Fails with `GitNotInstalled` when git cannot be spawned and
    /// `NotAGitRepository` when `path` is not inside a working copy.
    pub fn open(path: &Path) -> Result<Self, CleanerError> {
        let output = Command::new("git")
            .arg("-C")
            .arg(path)
            .args(["rev-parse", "--show-toplevel"])
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    CleanerError::GitNotInstalled
                } else {
                    CleanerError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(CleanerError::NotAGitRepository {
                path: path.display().to_string(),
            });
        }

        let top = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!(repo_root = %top, "opened repository");
        Ok(Self {
            repo_root: PathBuf::from(top),
        })
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    fn run(&self, args: &[&str]) -> Result<Output, CleanerError> {
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.repo_root)
            .args(args)
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    CleanerError::GitNotInstalled
                } else {
                    CleanerError::Io(e)
                }
            })?;
        debug!(args = ?args, status = ?output.status.code(), "git");
        Ok(output)
    }

    /// Run a command and turn a non-zero exit into `Backend`
    fn run_checked(&self, command: &str, args: &[&str]) -> Result<Output, CleanerError> {
        let output = self.run(args)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CleanerError::backend(command, stderr.trim()));
        }
        Ok(output)
    }

    fn ref_exists(&self, full_ref: &str) -> bool {
        self.run(&["rev-parse", "--verify", "--quiet", full_ref])
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Whether a stopped rebase left its state directory behind
    fn rebase_in_progress(&self) -> bool {
        ["rebase-merge", "rebase-apply"].iter().any(|state| {
            self.run(&["rev-parse", "--git-path", state])
                .ok()
                .filter(|o| o.status.success())
                .map(|o| {
                    let rel = String::from_utf8_lossy(&o.stdout).trim().to_string();
                    self.repo_root.join(rel).exists()
                })
                .unwrap_or(false)
        })
    }
}

impl VcsGateway for GitCli {
    fn fetch_all(&self) -> Result<(), CleanerError> {
        self.run_checked("fetch", &["fetch", "--all", "--quiet"])?;
        Ok(())
    }

    fn has_local_branch(&self, name: &str) -> bool {
        self.ref_exists(&format!("refs/heads/{}", name))
    }

    fn has_remote_branch(&self, name: &str) -> bool {
        self.ref_exists(&format!("refs/remotes/{}", name))
    }

    fn local_branches(&self) -> Result<Vec<String>, CleanerError> {
        let output = self.run_checked(
            "for-each-ref",
            &["for-each-ref", "--format=%(refname)", "refs/heads/"],
        )?;
        let mut branches: Vec<String> = String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter_map(|line| line.trim().strip_prefix("refs/heads/"))
            .map(str::to_string)
            .collect();
        branches.sort();
        Ok(branches)
    }

    fn is_working_tree_clean(&self) -> Result<bool, CleanerError> {
        let output = self.run_checked(
            "status",
            &["status", "--porcelain", "--untracked-files=no"],
        )?;
        Ok(output.stdout.iter().all(u8::is_ascii_whitespace))
    }

    fn checkout(&self, branch: &str, new_branch: Option<&str>) -> Result<(), CleanerError> {
        match new_branch {
            Some(new_branch) => {
                self.run_checked("checkout", &["checkout", "--quiet", "-b", new_branch, branch, "--"])?
            }
            None => self.run_checked("checkout", &["checkout", "--quiet", branch, "--"])?,
        };
        Ok(())
    }

    fn rebase(&self, onto: &str) -> Result<RebaseOutcome, CleanerError> {
        // updateRefs would move every other branch pointing into the replayed
        // range, including the candidate the temporary branch was copied from.
        let output = self.run(&["-c", "rebase.updateRefs=false", "rebase", "--quiet", onto])?;
        if output.status.success() {
            return Ok(RebaseOutcome::Clean);
        }

        if self.rebase_in_progress() {
            return Ok(RebaseOutcome::Conflict);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(CleanerError::backend("rebase", stderr.trim()))
    }

    fn abort_rebase(&self) {
        if !self.rebase_in_progress() {
            return;
        }
        match self.run(&["rebase", "--abort"]) {
            Ok(output) if output.status.success() => {}
            Ok(output) => warn!(
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "git rebase --abort failed"
            ),
            Err(e) => warn!(error = %e, "git rebase --abort failed"),
        }
    }

    fn delete_branch(&self, name: &str, force: bool) -> Result<(), CleanerError> {
        if !self.has_local_branch(name) {
            if force {
                return Ok(());
            }
            return Err(CleanerError::backend(
                "branch",
                format!("branch '{}' not found", name),
            ));
        }
        // Merge status is irrelevant here; only existence is checked
        self.run_checked("branch", &["branch", "-D", name])?;
        Ok(())
    }

    fn head_commit_hash(&self) -> Result<CommitHash, CleanerError> {
        // A fresh process per call, so refs written by the previous checkout
        // or rebase are always visible.
        let output = self.run_checked("rev-parse", &["rev-parse", "--verify", "HEAD"])?;
        CommitHash::parse(&String::from_utf8_lossy(&output.stdout))
    }
}
