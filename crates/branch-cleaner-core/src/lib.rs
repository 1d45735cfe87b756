//! branch-cleaner-core: redundant branch detection over a git backend
//!
//! A local branch is redundant when replaying it onto a reference branch
//! yields exactly the reference head commit. This crate provides the backend
//! abstraction, the scanner that runs one isolated rebase trial per branch,
//! and the policy that turns confirmed branches into deletions.

/// Core error types for branch-cleaner operations
pub mod error;

/// Configuration handling
pub mod config;

/// Core data types (CommitHash, RebaseOutcome, Verdict, ...)
pub mod types;

/// Version-control backend abstraction and git CLI implementation
pub mod gateway;

/// Per-branch rebase trials
pub mod scanner;

/// Deletion selection policy
pub mod deletion;

/// User interaction trait used by the confirmation step
pub mod interaction;

// Re-exports for convenience
pub use config::{CleanerConfig, Config};
pub use deletion::{DeletionMode, delete_branches, select_for_deletion};
pub use error::CleanerError;
pub use gateway::{GitCli, VcsGateway};
pub use interaction::{InteractionAdapter, InteractionError, InteractionResult};
pub use scanner::{NoProgress, ProgressSink, RedundancyScanner, ensure_remote_reference};
pub use types::{BranchReport, CommitHash, DEFAULT_TEMP_BRANCH, RebaseOutcome, ScanReport, Verdict};
