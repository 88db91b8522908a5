//! Diagnostic logging setup
//!
//! Library code emits `tracing` events; the binary installs a stderr
//! subscriber here. `RUST_LOG` takes precedence over the verbosity flags.

use tracing_subscriber::EnvFilter;

/// Default filter for the given verbosity flags
pub fn default_filter(verbose: bool, quiet: bool) -> &'static str {
    match (verbose, quiet) {
        (_, true) => "error",
        (true, false) => "chart_pusher=debug,warn",
        (false, false) => "warn",
    }
}

/// Install the global subscriber. Calling it twice is harmless.
pub fn init(verbose: bool, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose, quiet)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .try_init();
}
