//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Loader / registry / watcher produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (load and reload counters, live handle gauge)
//!
//! Consumers:
//!     → Whatever subscriber and recorder the host process installs
//! ```
//!
//! # Design Decisions
//! - The library never installs a metrics recorder; without one the
//!   macros are no-ops
//! - Logging init is optional and idempotent so embedding processes keep
//!   their own subscriber

pub mod logging;
pub mod metrics;
