//! Core data types for redundancy scanning

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CleanerError;

/// Reserved branch name used as the staging area for one rebase trial
pub const DEFAULT_TEMP_BRANCH: &str = "__cleaner_tmp__";

/// Whether `name` has the reserved `__name__` shape required of staging branches
///
/// The staging branch is force-deleted without further checks, so it must
/// never be able to name a regular branch.
pub fn is_reserved_temp_branch(name: &str) -> bool {
    name.len() > 4
        && name.starts_with("__")
        && name.ends_with("__")
        && !name[2..name.len() - 2].trim_matches('_').is_empty()
}

/// Object id of a single commit
///
/// Stored lowercase so that two hashes compare equal exactly when they name
/// the same snapshot. Accepts SHA-1 (40) and SHA-256 (64) hex ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitHash(String);

impl CommitHash {
    /// Parse backend output into a hash, trimming surrounding whitespace
    pub fn parse(raw: &str) -> Result<Self, CleanerError> {
        let value = raw.trim();
        let valid_len = value.len() == 40 || value.len() == 64;
        if !valid_len || !value.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CleanerError::InvalidCommitHash {
                value: value.to_string(),
            });
        }
        Ok(Self(value.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for display
    pub fn short(&self) -> &str {
        &self.0[..7]
    }
}

impl fmt::Display for CommitHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of replaying the current branch onto another one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebaseOutcome {
    /// Every commit applied
    Clean,
    /// Replay stopped on conflicting content; a rebase is in progress
    Conflict,
}

/// Per-branch conclusion of a trial
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    /// Rebased cleanly onto exactly the reference head
    Redundant,
    /// Rebase stopped on a conflict and was aborted
    Conflict,
    /// Rebased cleanly but ended on a different commit
    Diverged { head: CommitHash },
}

impl Verdict {
    pub fn is_redundant(&self) -> bool {
        matches!(self, Verdict::Redundant)
    }
}

/// One analyzed branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchReport {
    pub branch: String,
    #[serde(flatten)]
    pub verdict: Verdict,
}

/// Outcome of a full scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    /// Reference branch the candidates were replayed onto
    pub reference_branch: String,
    /// Reference head captured once before the first trial
    pub reference_head: CommitHash,
    /// Every analyzed branch, in scan order
    pub branches: Vec<BranchReport>,
}

impl ScanReport {
    /// Branches confirmed redundant, in scan order
    pub fn redundant(&self) -> Vec<String> {
        self.branches
            .iter()
            .filter(|report| report.verdict.is_redundant())
            .map(|report| report.branch.clone())
            .collect()
    }
}
