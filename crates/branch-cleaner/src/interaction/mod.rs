//! CLI interaction module
//!
//! This module provides the `CliAdapter` implementation of the core
//! `InteractionAdapter` trait for terminal prompts using dialoguer.

mod cli_adapter;

pub use cli_adapter::{CliAdapter, cancellation_flag};
