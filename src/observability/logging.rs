//! Structured logging.
//!
//! # Responsibilities
//! - Install a `tracing` subscriber for binaries and tests that want one
//! - Honour `RUST_LOG`, falling back to a caller-chosen directive
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - `try_init` so a second call (or a host subscriber) is not an error

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
///
/// Returns `false` if a subscriber was already installed.
pub fn init(default_directive: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
