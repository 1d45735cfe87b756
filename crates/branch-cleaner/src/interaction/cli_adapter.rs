//! CLI adapter implementation using dialoguer for interactive prompts
//!
//! This module provides `CliAdapter`, which implements `InteractionAdapter`
//! for terminal-based confirmation with customizable spacing.

use std::fmt::Write as FmtWrite;
use std::io::{IsTerminal, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use console::Style;
use dialoguer::theme::Theme;
use dialoguer::{Confirm, Select};
use owo_colors::OwoColorize;

use branch_cleaner_core::{InteractionAdapter, InteractionError, InteractionResult};

/// Global flag to track if Ctrl+C was pressed
static CANCELLED: AtomicBool = AtomicBool::new(false);

/// Flag the scanner polls between branch trials
pub fn cancellation_flag() -> &'static AtomicBool {
    &CANCELLED
}

/// Check if cancellation was requested
fn is_cancelled() -> bool {
    CANCELLED.load(Ordering::SeqCst)
}

/// Set up the global Ctrl+C handler
///
/// The handler only records the request. The running git command receives
/// the signal itself, and the scanner finishes cleanup before stopping.
pub fn setup_ctrl_c_handler() {
    static HANDLER_SET: AtomicBool = AtomicBool::new(false);

    if HANDLER_SET.swap(true, Ordering::SeqCst) {
        return;
    }

    if let Err(e) = ctrlc::set_handler(move || {
        CANCELLED.store(true, Ordering::SeqCst);
        eprintln!();
    }) {
        tracing::warn!(error = %e, "could not set Ctrl+C handler");
    }
}

/// Custom theme with generous spacing between elements
struct SpacedTheme {
    prompt_style: Style,
    active_style: Style,
    inactive_style: Style,
    hint_style: Style,
}

impl SpacedTheme {
    fn new() -> Self {
        Self {
            prompt_style: Style::new().cyan().bold(),
            active_style: Style::new().cyan(),
            inactive_style: Style::new(),
            hint_style: Style::new().dim(),
        }
    }
}

impl Theme for SpacedTheme {
    fn format_confirm_prompt(
        &self,
        f: &mut dyn FmtWrite,
        prompt: &str,
        default: Option<bool>,
    ) -> std::fmt::Result {
        let hint = match default {
            Some(true) => "(Y/n)",
            Some(false) => "(y/N)",
            None => "(y/n)",
        };
        write!(
            f,
            "{} {}",
            self.prompt_style.apply_to(format!("? {}", prompt)),
            self.hint_style.apply_to(hint)
        )
    }

    fn format_confirm_prompt_selection(
        &self,
        f: &mut dyn FmtWrite,
        prompt: &str,
        selection: Option<bool>,
    ) -> std::fmt::Result {
        let answer = match selection {
            Some(true) => "Yes",
            Some(false) => "No",
            None => "?",
        };
        write!(
            f,
            "{} {}",
            self.prompt_style.apply_to(format!("? {}", prompt)),
            self.active_style.apply_to(answer)
        )
    }

    fn format_select_prompt(&self, f: &mut dyn FmtWrite, prompt: &str) -> std::fmt::Result {
        write!(f, "{}", self.prompt_style.apply_to(format!("? {}", prompt)))
    }

    fn format_select_prompt_selection(
        &self,
        f: &mut dyn FmtWrite,
        prompt: &str,
        sel: &str,
    ) -> std::fmt::Result {
        write!(
            f,
            "{} {}",
            self.prompt_style.apply_to(format!("? {}", prompt)),
            self.active_style.apply_to(sel)
        )
    }

    fn format_select_prompt_item(
        &self,
        f: &mut dyn FmtWrite,
        text: &str,
        active: bool,
    ) -> std::fmt::Result {
        writeln!(f)?;
        if active {
            write!(
                f,
                "  {} {}",
                self.active_style.apply_to(">"),
                self.active_style.apply_to(text)
            )
        } else {
            write!(f, "    {}", self.inactive_style.apply_to(text))
        }
    }
}

/// CLI adapter for terminal-based user interaction
pub struct CliAdapter {
    is_tty: bool,
}

impl CliAdapter {
    pub fn new() -> Self {
        setup_ctrl_c_handler();
        Self {
            is_tty: std::io::stdin().is_terminal(),
        }
    }

    #[allow(dead_code)]
    pub fn with_tty(is_tty: bool) -> Self {
        setup_ctrl_c_handler();
        Self { is_tty }
    }

    #[allow(dead_code)]
    pub fn is_tty(&self) -> bool {
        self.is_tty
    }

    fn check_cancelled(&self) -> InteractionResult<()> {
        if is_cancelled() {
            Err(InteractionError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn require_tty(&self) -> InteractionResult<()> {
        if !self.is_tty {
            Err(InteractionError::NonTty)
        } else {
            Ok(())
        }
    }

    fn convert_dialoguer_error(err: dialoguer::Error) -> InteractionError {
        InteractionError::Io(err.to_string())
    }

    pub fn print_error(&self, message: &str) {
        eprintln!("{} {}", "error:".red().bold(), message.red().bold());
        let _ = std::io::stderr().flush();
    }

    pub fn print_header(&self, message: &str) {
        println!("{}", message.cyan().bold());
        let _ = std::io::stdout().flush();
    }
}

impl Default for CliAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionAdapter for CliAdapter {
    fn ask_select(&self, prompt: &str, options: &[&str]) -> InteractionResult<usize> {
        self.require_tty()?;
        self.check_cancelled()?;

        if options.is_empty() {
            return Err(InteractionError::InvalidInput(
                "options cannot be empty".to_string(),
            ));
        }

        let theme = SpacedTheme::new();

        // Print spacing before the select
        println!();

        Select::with_theme(&theme)
            .with_prompt(prompt)
            .items(options)
            .default(0)
            .interact()
            .map_err(Self::convert_dialoguer_error)
    }

    fn ask_confirm(&self, prompt: &str, default: bool) -> InteractionResult<bool> {
        self.require_tty()?;
        self.check_cancelled()?;

        let theme = SpacedTheme::new();

        Confirm::with_theme(&theme)
            .with_prompt(prompt)
            .default(default)
            .interact()
            .map_err(Self::convert_dialoguer_error)
    }

    fn print_info(&self, message: &str) {
        println!("{}", message);
        let _ = std::io::stdout().flush();
    }

    fn print_warning(&self, message: &str) {
        println!("{} {}", "warning:".yellow().bold(), message.yellow());
        let _ = std::io::stdout().flush();
    }

    fn print_success(&self, message: &str) {
        println!("{} {}", "✓".green(), message.green());
        let _ = std::io::stdout().flush();
    }
}
