//! Logging initialization.
//!
//! Logs go to stderr so command output on stdout stays machine-readable.

use tracing_subscriber::EnvFilter;

/// Build the log filter.
///
/// `RUST_LOG` wins; otherwise `verbose` turns on debug output for the
/// snapkit crates, else `level` applies to them.
pub fn filter(verbose: bool, level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    let directives = if verbose {
        "snapkit=debug,snapkit_snapshot=debug".to_string()
    } else {
        format!("snapkit={level},snapkit_snapshot={level}")
    };
    EnvFilter::try_new(&directives)
        .unwrap_or_else(|_| EnvFilter::new("snapkit=info,snapkit_snapshot=info"))
}

/// Initialize logging. Call once at startup.
pub fn init_logging(verbose: bool, level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(filter(verbose, level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
