//! Tracing subscriber setup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global tracing subscriber.
///
/// Respects `RUST_LOG`; defaults to debug-level events from this crate.
/// Safe to call more than once (later calls are no-ops), so tests can use it
/// freely.
pub fn init() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cluster_transport=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
