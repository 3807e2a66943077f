//! Logging utilities for verdict components.
//!
//! The EM engine emits per-iteration `debug!` events under the
//! `verdict_core` target; these helpers wire up a subscriber for binaries
//! and test runs that want to see them.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing with verdict defaults.
///
/// Sets up tracing-subscriber with:
/// - Environment filter (RUST_LOG)
/// - Compact format suitable for terminal output
///
/// Panics if a global subscriber is already installed; tests use
/// [`try_init`] instead.
pub fn init() {
    init_with_filter("info");
}

/// Initialize tracing with a custom default filter.
pub fn init_with_filter(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

/// Best-effort initialization for test binaries.
///
/// Defaults to `verdict_core=debug` so the per-iteration EM events show up
/// under `--nocapture`, routes output through the test writer, and keeps
/// whatever subscriber is already installed when called more than once.
pub fn try_init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("verdict_core=debug"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_test_writer())
        .try_init();
}
