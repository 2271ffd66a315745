//! Diagnostic logging setup
//!
//! Command output goes to stdout; diagnostics go to stderr so they never mix
//! with it. Filtering follows `RUST_LOG`, defaulting to `info`.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Later calls are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
