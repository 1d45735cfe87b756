//! tracing subscriber setup

use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter directive
pub const LOG_ENV: &str = "BRANCH_CLEANER_LOG";

/// Install the stderr subscriber
///
/// `BRANCH_CLEANER_LOG` wins when set; otherwise `--verbose` selects debug
/// output and the default is warnings only.
pub fn init(verbose: bool) {
    let fallback = if verbose {
        "branch_cleaner=debug,branch_cleaner_core=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
