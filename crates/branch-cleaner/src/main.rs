//! branch-cleaner CLI - Find and delete local branches already contained in a reference branch

mod cli;
mod colors;
mod commands;
mod interaction;
mod logging;
mod output;
mod progress;

use std::process::ExitCode;

use commands::CleanOptions;

fn main() -> ExitCode {
    let cli = cli::parse();
    logging::init(cli.verbose);

    let options = CleanOptions {
        repository: cli.path_to_repository,
        reference_branch: cli.reference_branch,
        skip_branches: cli.skip_branch,
        yes: cli.yes,
        dry_run: cli.dry_run,
        no_fetch: cli.no_fetch,
        config: cli.config,
    };

    let result = commands::run_clean(options, cli.json, cli.quiet);

    match result {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(1)
        }
    }
}
