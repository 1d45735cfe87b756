//! Implementation of the clean run
//!
//! fetch -> resolve reference -> scan -> list -> confirm -> delete

use std::collections::BTreeSet;
use std::path::PathBuf;

use owo_colors::OwoColorize;

use branch_cleaner_core::{
    CleanerError, Config, DeletionMode, GitCli, InteractionAdapter, RedundancyScanner, VcsGateway,
    delete_branches, ensure_remote_reference, select_for_deletion,
};

use crate::colors::{COLORS, done_mark};
use crate::interaction::{CliAdapter, cancellation_flag};
use crate::output::{CleanData, JsonIssue, JsonResponse};
use crate::progress::ScanProgress;

/// Options collected from the command line
#[derive(Debug, Clone, Default)]
pub struct CleanOptions {
    pub repository: PathBuf,
    pub reference_branch: Option<String>,
    pub skip_branches: Vec<String>,
    pub yes: bool,
    pub dry_run: bool,
    pub no_fetch: bool,
    pub config: Option<PathBuf>,
}

/// Fully resolved settings for one run
#[derive(Debug, Clone, PartialEq, Eq)]
struct RunSettings {
    reference: String,
    skip: BTreeSet<String>,
    temp_branch: String,
    fetch: bool,
}

impl RunSettings {
    /// Command line over config file over defaults; skip sets are merged
    fn resolve(options: &CleanOptions, config: Config) -> Self {
        let cleaner = config.cleaner;
        let skip = cleaner
            .skip_branches
            .into_iter()
            .chain(options.skip_branches.iter().cloned())
            .collect();
        Self {
            reference: options
                .reference_branch
                .clone()
                .unwrap_or(cleaner.reference_branch),
            skip,
            temp_branch: cleaner.temp_branch,
            fetch: cleaner.fetch && !options.no_fetch,
        }
    }
}

/// Run the clean command
pub fn run_clean(options: CleanOptions, json_output: bool, quiet: bool) -> Result<i32, String> {
    let adapter = CliAdapter::new();
    let say = !quiet && !json_output;
    let mut data = CleanData {
        dry_run: options.dry_run,
        ..Default::default()
    };

    let result = clean(&options, &adapter, say, json_output, &mut data);

    match result {
        Ok(()) => {
            if json_output {
                let response = JsonResponse::ok("clean", data);
                println!(
                    "{}",
                    serde_json::to_string_pretty(&response).map_err(|e| e.to_string())?
                );
            }
            Ok(0)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "clean failed");
            if json_output {
                let issues = vec![JsonIssue::from(&e)];
                let response = JsonResponse::error("clean", data, issues);
                println!(
                    "{}",
                    serde_json::to_string_pretty(&response).map_err(|e| e.to_string())?
                );
            } else {
                adapter.print_error(&e.to_string());
            }
            Ok(e.exit_code())
        }
    }
}

fn clean(
    options: &CleanOptions,
    adapter: &CliAdapter,
    say: bool,
    json_output: bool,
    data: &mut CleanData,
) -> Result<(), CleanerError> {
    let git = GitCli::open(&options.repository)?;
    let config = Config::discover(git.repo_root(), options.config.as_deref())?;
    let settings = RunSettings::resolve(options, config);
    data.reference_branch = settings.reference.clone();

    if settings.fetch {
        step(say, "Fetching branches... ", || git.fetch_all())?;
    }

    ensure_remote_reference(&git, &settings.reference)?;

    if !git.is_working_tree_clean()? {
        return Err(CleanerError::DirtyWorkingTree);
    }

    if say {
        println!();
        adapter.print_header("Analyzing branches...");
    }

    let branches = git.local_branches()?;
    let scanner = RedundancyScanner::new(&git, settings.reference.clone())
        .with_temp_branch(settings.temp_branch.clone())
        .with_skip(settings.skip.iter().cloned())
        .with_cancellation(cancellation_flag());

    let mut progress = ScanProgress::new(say);
    let report = scanner.scan(&branches, &mut progress)?;
    let redundant = report.redundant();

    data.reference_head = Some(report.reference_head.to_string());
    data.redundant = redundant.clone();
    data.branches = report.branches;

    if say {
        println!();
        println!();
    }

    if redundant.is_empty() {
        if say {
            adapter.print_success(&format!(
                "No branch is up-to-date with {}.",
                settings.reference
            ));
        }
        return Ok(());
    }

    if say {
        adapter.print_info(&format!(
            "The following local branches are up-to-date with {} at {}:",
            settings.reference.style(COLORS.success),
            report.reference_head.short()
        ));
        println!();
        for branch in &redundant {
            println!(" * {}", branch.style(COLORS.active));
        }
    }

    let mode = if options.dry_run {
        DeletionMode::None
    } else if options.yes {
        DeletionMode::All
    } else if json_output {
        data.dry_run = true;
        DeletionMode::None
    } else {
        DeletionMode::prompt(adapter)?
    };

    let chosen = select_for_deletion(&redundant, mode, adapter)?;
    if chosen.is_empty() {
        if say {
            adapter.print_success("No branch has been deleted.");
        }
        return Ok(());
    }

    let deleted = &mut data.deleted;
    let count = delete_branches(&git, &chosen, |branch| {
        if say {
            println!("Deleting branch {}... {}", branch.style(COLORS.success), done_mark());
        }
        deleted.push(branch.to_string());
    })?;

    if say {
        adapter.print_success(&format!("Successfully deleted {} branches!", count));
    }
    Ok(())
}

/// Print `label`, run `op`, and finish the line with a check mark or a cross
fn step<T>(
    say: bool,
    label: &str,
    op: impl FnOnce() -> Result<T, CleanerError>,
) -> Result<T, CleanerError> {
    if say {
        print!("{}", label);
        let _ = std::io::Write::flush(&mut std::io::stdout());
    }
    let result = op();
    if say {
        match &result {
            Ok(_) => println!("{}", done_mark()),
            Err(_) => println!("{}", "✘".style(COLORS.fail)),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use branch_cleaner_core::CleanerConfig;

    fn config(reference: &str, skip: &[&str], fetch: bool) -> Config {
        Config {
            cleaner: CleanerConfig {
                reference_branch: reference.to_string(),
                skip_branches: skip.iter().map(|s| s.to_string()).collect(),
                fetch,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_settings_use_config_when_cli_silent() {
        let options = CleanOptions::default();
        let settings = RunSettings::resolve(&options, config("upstream/main", &["main"], true));
        assert_eq!(settings.reference, "upstream/main");
        assert!(settings.skip.contains("main"));
        assert!(settings.fetch);
    }

    #[test]
    fn test_settings_cli_overrides_and_merges() {
        let options = CleanOptions {
            reference_branch: Some("origin/develop".to_string()),
            skip_branches: vec!["release".to_string()],
            no_fetch: true,
            ..Default::default()
        };
        let settings = RunSettings::resolve(&options, config("upstream/main", &["main"], true));
        assert_eq!(settings.reference, "origin/develop");
        assert_eq!(
            settings.skip.into_iter().collect::<Vec<_>>(),
            vec!["main", "release"]
        );
        assert!(!settings.fetch);
    }

    #[test]
    fn test_settings_config_can_disable_fetch() {
        let settings = RunSettings::resolve(&CleanOptions::default(), config("origin/master", &[], false));
        assert!(!settings.fetch);
    }

    #[test]
    fn test_step_passes_result_through() {
        let ok: Result<u8, CleanerError> = step(false, "x", || Ok(3));
        assert_eq!(ok.unwrap(), 3);
        let err = step::<()>(false, "x", || Err(CleanerError::Cancelled)).unwrap_err();
        assert!(matches!(err, CleanerError::Cancelled));
    }
}
