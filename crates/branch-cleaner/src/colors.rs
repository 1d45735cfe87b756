//! Semantic color theme for consistent terminal output
//!
//! - `ACTIVE` => blue - headers, branch names
//! - `SUCCESS` => green - completed operations, check marks
//! - `FAIL` => red - errors

use std::sync::LazyLock;

use owo_colors::Style;

/// Semantic color definitions for terminal output
pub struct SemanticColors {
    pub active: Style,
    pub success: Style,
    pub fail: Style,
}

impl Default for SemanticColors {
    fn default() -> Self {
        Self {
            active: Style::new().blue(),
            success: Style::new().green(),
            fail: Style::new().red(),
        }
    }
}

/// Global default theme
pub static COLORS: LazyLock<SemanticColors> = LazyLock::new(SemanticColors::default);

/// Check mark printed after a finished step
pub fn done_mark() -> String {
    use owo_colors::OwoColorize;
    "✔".style(COLORS.success).to_string()
}
