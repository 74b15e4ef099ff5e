//! Tracing subscriber setup for engine hosts.
//!
//! The engine itself only emits `tracing` events; installing a subscriber is
//! the embedding application's choice. These helpers cover the common cases
//! for binaries and integration tests.

use tracing_subscriber::EnvFilter;

/// Installs a formatted subscriber filtered by `RUST_LOG`, defaulting to
/// `info` for this crate. Safe to call more than once; only the first call
/// installs anything.
pub fn init() {
    init_with_filter("prism_engine=info,warn");
}

/// Installs a formatted subscriber with an explicit default filter, still
/// overridable through `RUST_LOG`.
pub fn init_with_filter(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

/// Installs a JSON-formatted subscriber for log-aggregated deployments.
pub fn init_json() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("prism_engine=info,warn"));

    let _ = tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_current_span(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init();
        init();
        init_with_filter("debug");
    }
}
