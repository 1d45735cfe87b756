//! CLI argument parsing with clap derive

use std::path::PathBuf;

use clap::Parser;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// branch-cleaner - Delete local branches already contained in a reference branch
#[derive(Parser, Debug)]
#[command(name = "branch-cleaner")]
#[command(version = VERSION)]
#[command(about = "Find local branches already contained in a reference branch and offer to delete them")]
#[command(long_about = "Find local branches already contained in a reference branch and offer to delete them.\n\nEach local branch is copied to a temporary branch and rebased onto the reference.\nA branch is redundant when the rebase applies cleanly and ends exactly on the\nreference head commit. Conflicting or diverging branches are kept.\n\nThe repository is left checked out on the reference branch.\n\nConfiguration:\n  <repo>/.branch-cleaner.toml  [cleaner] reference_branch, skip_branches, temp_branch, fetch\n  BRANCH_CLEANER_LOG           tracing filter (e.g. debug)")]
pub struct Cli {
    /// Increase output verbosity
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Output in JSON format (never prompts; deletes only with --yes)
    #[arg(long)]
    pub json: bool,

    /// The git repository path
    pub path_to_repository: PathBuf,

    /// The remote branch to check against (default: origin/master)
    pub reference_branch: Option<String>,

    /// Skip a local branch, for example your master or main branch
    #[arg(short = 's', long = "skip-branch", value_name = "BRANCH")]
    pub skip_branch: Vec<String>,

    /// Delete every redundant branch without asking
    #[arg(short = 'y', long, conflicts_with = "dry_run")]
    pub yes: bool,

    /// Only report redundant branches
    #[arg(long)]
    pub dry_run: bool,

    /// Do not fetch remotes before scanning
    #[arg(long)]
    pub no_fetch: bool,

    /// Configuration file (default: <repo>/.branch-cleaner.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Get the command args for use in the application
pub fn parse() -> Cli {
    Cli::parse()
}
