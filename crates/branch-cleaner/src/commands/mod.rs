//! CLI command implementations

pub mod clean;

pub use clean::{CleanOptions, run_clean};
