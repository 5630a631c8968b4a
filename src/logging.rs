//! Tracing subscriber setup for the binary.

use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Environment variable consulted before `RUST_LOG`.
pub const LOG_ENV: &str = "GRID_SENSE_LOG";

const DEFAULT_DIRECTIVE: &str = "info";

/// Resolves the filter: explicit directive, then `GRID_SENSE_LOG`, then
/// `RUST_LOG`, then `info`. An unparsable directive falls back to `info`.
pub fn filter(directive: Option<&str>) -> EnvFilter {
    let directive = directive
        .map(str::to_owned)
        .or_else(|| std::env::var(LOG_ENV).ok());
    match directive {
        Some(d) => EnvFilter::try_new(&d).unwrap_or_else(|err| {
            eprintln!("invalid log directive {d:?} ({err}); defaulting to {DEFAULT_DIRECTIVE}");
            EnvFilter::new(DEFAULT_DIRECTIVE)
        }),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE)),
    }
}

/// Installs a stderr formatter as the global subscriber.
///
/// Logs go to stderr so that `--once` output on stdout stays machine-readable.
/// Calling this more than once is harmless; later calls are ignored.
pub fn init(directive: Option<&str>) {
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter(directive))
        .with(fmt_layer)
        .try_init()
        .ok();
}
