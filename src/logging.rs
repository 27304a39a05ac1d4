//! Diagnostic logging.
//!
//! The table owns stdout, so log lines go to stderr. The level is taken from `RUST_LOG`
//! and defaults to `warn`, e.g. `RUST_LOG=avalon_fleet=debug avalon-fleet --ips ...`.

use std::io;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_FILTER: &str = "warn";

/// Installs the global subscriber. Calling it twice is harmless.
pub fn init_logging() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .try_init();
}
