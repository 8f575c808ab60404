//! Logging configuration.
//!
//! Library code only emits `tracing` events; binaries choose the subscriber.

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "info";

/// Filter used with `--verbose`, which surfaces every executed statement.
const VERBOSE_FILTER: &str = "sqlany_adapter=debug,info";

/// Builds the filter from `RUST_LOG`, falling back to the default levels.
pub fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            VERBOSE_FILTER
        } else {
            DEFAULT_FILTER
        })
    })
}

/// Initializes logging to stderr.
///
/// Stdout stays reserved for command output.
pub fn init_stderr_logging(verbose: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_writer(std::io::stderr)
        .init();
}
