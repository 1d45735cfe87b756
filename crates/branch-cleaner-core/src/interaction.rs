//! Interaction trait for the confirmation step
//!
//! The core never talks to a terminal directly. Front ends implement
//! [`InteractionAdapter`]; the deletion policy only needs a select and a
//! yes/no question.

use thiserror::Error;

/// Errors raised by an interaction front end
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InteractionError {
    /// User pressed Ctrl+C
    #[error("cancelled by user")]
    Cancelled,

    /// A prompt was required but stdin is not a terminal
    #[error("stdin is not a terminal (use --yes or --dry-run)")]
    NonTty,

    /// Prompt arguments were unusable
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Terminal IO failure
    #[error("terminal IO error: {0}")]
    Io(String),
}

/// Result alias for interaction calls
pub type InteractionResult<T> = Result<T, InteractionError>;

/// Front-end contract for prompts and status lines
pub trait InteractionAdapter {
    /// Ask the user to pick one option; returns its index
    fn ask_select(&self, prompt: &str, options: &[&str]) -> InteractionResult<usize>;

    /// Ask a yes/no question
    fn ask_confirm(&self, prompt: &str, default: bool) -> InteractionResult<bool>;

    fn print_info(&self, message: &str);

    fn print_warning(&self, message: &str);

    fn print_success(&self, message: &str);
}
