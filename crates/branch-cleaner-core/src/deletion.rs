//! Deletion selection policy
//!
//! Turns the confirmed-redundant list into the subset that actually gets
//! deleted, and deletes it.

use tracing::info;

use crate::error::CleanerError;
use crate::gateway::VcsGateway;
use crate::interaction::{InteractionAdapter, InteractionError};

/// How the user wants redundant branches handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionMode {
    /// Delete every redundant branch
    All,
    /// Delete nothing
    None,
    /// Confirm each branch individually
    AskEach,
}

impl DeletionMode {
    /// Choices offered by [`DeletionMode::prompt`], in display order
    pub const CHOICES: [(DeletionMode, &'static str); 3] = [
        (DeletionMode::All, "Yes, delete these branches"),
        (DeletionMode::None, "No, don't delete any branch"),
        (DeletionMode::AskEach, "Ask for each branch"),
    ];

    /// Ask the user which mode to use
    pub fn prompt(adapter: &dyn InteractionAdapter) -> Result<Self, CleanerError> {
        let labels: Vec<&str> = Self::CHOICES.iter().map(|(_, label)| *label).collect();
        let index = adapter.ask_select("Do you want to delete these branches?", &labels)?;
        Self::CHOICES
            .get(index)
            .map(|(mode, _)| *mode)
            .ok_or_else(|| {
                InteractionError::InvalidInput(format!("selection {} out of range", index)).into()
            })
    }
}

/// Pick the branches to delete
///
/// Returns a subset of `redundant` in its original order. With
/// [`DeletionMode::AskEach`] every branch is asked about exactly once,
/// defaulting to "no"; a declined branch is not asked again.
pub fn select_for_deletion(
    redundant: &[String],
    mode: DeletionMode,
    adapter: &dyn InteractionAdapter,
) -> Result<Vec<String>, CleanerError> {
    match mode {
        DeletionMode::None => Ok(Vec::new()),
        DeletionMode::All => Ok(redundant.to_vec()),
        DeletionMode::AskEach => {
            let mut chosen = Vec::new();
            for branch in redundant {
                if adapter.ask_confirm(&format!("Delete branch {}?", branch), false)? {
                    chosen.push(branch.clone());
                }
            }
            Ok(chosen)
        }
    }
}

/// Force-delete `branches` in order, reporting each one after it is gone
///
/// Stops at the first failure; branches deleted before it stay deleted.
pub fn delete_branches<G: VcsGateway + ?Sized>(
    gateway: &G,
    branches: &[String],
    mut on_deleted: impl FnMut(&str),
) -> Result<usize, CleanerError> {
    for branch in branches {
        gateway.delete_branch(branch, true)?;
        info!(branch = %branch, "deleted branch");
        on_deleted(branch);
    }
    Ok(branches.len())
}
