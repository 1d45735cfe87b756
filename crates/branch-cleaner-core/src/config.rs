//! Configuration handling for branch-cleaner

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CleanerError;
use crate::types::{DEFAULT_TEMP_BRANCH, is_reserved_temp_branch};

/// File looked up at the repository root when no `--config` is given
pub const CONFIG_FILE_NAME: &str = ".branch-cleaner.toml";

/// branch-cleaner configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Cleaner-specific settings
    #[serde(default)]
    pub cleaner: CleanerConfig,
}

/// Core cleaner settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CleanerConfig {
    /// Remote branch candidates are replayed onto
    #[serde(default = "default_reference_branch")]
    pub reference_branch: String,

    /// Local branches never analyzed
    #[serde(default)]
    pub skip_branches: Vec<String>,

    /// Staging branch name for rebase trials
    #[serde(default = "default_temp_branch")]
    pub temp_branch: String,

    /// Fetch all remotes before scanning
    #[serde(default = "default_fetch")]
    pub fetch: bool,
}

fn default_reference_branch() -> String {
    "origin/master".to_string()
}

fn default_temp_branch() -> String {
    DEFAULT_TEMP_BRANCH.to_string()
}

fn default_fetch() -> bool {
    true
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            reference_branch: default_reference_branch(),
            skip_branches: Vec::new(),
            temp_branch: default_temp_branch(),
            fetch: default_fetch(),
        }
    }
}

impl Config {
    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, CleanerError> {
        let config: Config =
            toml::from_str(content).map_err(|e| CleanerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load an explicit configuration file; a missing file is an error
    pub fn load(path: &Path) -> Result<Self, CleanerError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CleanerError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Resolve configuration for a repository
    ///
    /// Uses `explicit` when given, otherwise `<repo_root>/.branch-cleaner.toml`
    /// if it exists, otherwise defaults.
    pub fn discover(repo_root: &Path, explicit: Option<&Path>) -> Result<Self, CleanerError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let candidate: PathBuf = repo_root.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            tracing::debug!(path = %candidate.display(), "loading repository config");
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<(), CleanerError> {
        if self.cleaner.reference_branch.trim().is_empty() {
            return Err(CleanerError::Config(
                "reference_branch must not be empty".to_string(),
            ));
        }
        if !is_reserved_temp_branch(&self.cleaner.temp_branch) {
            return Err(CleanerError::Config(format!(
                "temp_branch {:?} must have the reserved __name__ form",
                self.cleaner.temp_branch
            )));
        }
        Ok(())
    }
}
