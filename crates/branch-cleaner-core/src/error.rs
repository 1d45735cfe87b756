//! Error types for branch-cleaner operations

use thiserror::Error;

use crate::interaction::InteractionError;

/// Core error type for branch-cleaner operations
#[derive(Error, Debug)]
pub enum CleanerError {
    // === Reference errors (E001-E002) ===
    /// E001: Reference branch does not resolve at all
    #[error("E001: Invalid reference branch {branch}")]
    ReferenceBranchNotFound { branch: String },

    /// E002: Reference branch only exists as a local branch
    #[error("E002: Only remote reference branches are supported at the moment ({branch} is local)")]
    ReferenceBranchLocalOnly { branch: String },

    // === Repository errors (E003-E006) ===
    /// E003: git executable not found
    #[error("E003: git is not installed or not on PATH")]
    GitNotInstalled,

    /// E004: Path is not inside a git repository
    #[error("E004: Not a git repository: {path}")]
    NotAGitRepository { path: String },

    /// E005: Tracked files have uncommitted changes
    #[error("E005: Working tree has uncommitted changes; commit or stash them first")]
    DirtyWorkingTree,

    /// E006: A backend command failed
    #[error("E006: git {command} failed: {reason}")]
    Backend { command: String, reason: String },

    /// E007: Backend returned something that is not an object id
    #[error("E007: Invalid commit hash: {value:?}")]
    InvalidCommitHash { value: String },

    // === Environment errors ===
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Prompt failed
    #[error("interaction failed: {0}")]
    Interaction(#[from] InteractionError),

    /// Ctrl+C observed between branch trials
    #[error("scan cancelled")]
    Cancelled,
}

impl CleanerError {
    /// Shorthand for a failed backend command
    pub fn backend(command: impl Into<String>, reason: impl Into<String>) -> Self {
        CleanerError::Backend {
            command: command.into(),
            reason: reason.into(),
        }
    }

    /// Get the error code (e.g., "E001", "E002")
    pub fn code(&self) -> &'static str {
        match self {
            CleanerError::ReferenceBranchNotFound { .. } => "E001",
            CleanerError::ReferenceBranchLocalOnly { .. } => "E002",
            CleanerError::GitNotInstalled => "E003",
            CleanerError::NotAGitRepository { .. } => "E004",
            CleanerError::DirtyWorkingTree => "E005",
            CleanerError::Backend { .. } => "E006",
            CleanerError::InvalidCommitHash { .. } => "E007",
            CleanerError::Config(_) => "E008",
            CleanerError::Io(_) => "E009",
            CleanerError::Interaction(_) => "E010",
            CleanerError::Cancelled => "E011",
        }
    }

    /// Get the exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            CleanerError::ReferenceBranchNotFound { .. }
            | CleanerError::ReferenceBranchLocalOnly { .. } => 1, // Usage errors

            CleanerError::Io(_) => 2,

            CleanerError::NotAGitRepository { .. } => 3,

            CleanerError::GitNotInstalled => 4,

            CleanerError::DirtyWorkingTree => 5,

            CleanerError::Backend { .. } | CleanerError::InvalidCommitHash { .. } => 6,

            CleanerError::Interaction(_) => 7,

            CleanerError::Config(_) => 8,

            CleanerError::Cancelled => 130, // Conventional SIGINT exit
        }
    }
}
