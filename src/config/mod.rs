//! Configuration file loading subsystem.
//!
//! # Data Flow
//! ```text
//! primary file, secondary file
//!     → loader.rs (permission check, read, parse each file)
//!     → merge.rs (primary wins on every conflict)
//!     → validation.rs (mandatory blocks and maps, once, on the result)
//!     → FileTables handed to the registry for publication
//!
//! On reload:
//!     watcher.rs detects change (or caller asks)
//!     → loader.rs parses from scratch
//!     → registry swaps the new tables in under the writer lock
//! ```
//!
//! # Design Decisions
//! - Parsing never touches shared state; only publication takes locks
//! - A failed load or reload leaves nothing behind
//! - Missing files are a policy decision, unsafe permissions never are

pub mod loader;
pub mod merge;
pub mod settings;
pub mod validation;
pub mod watcher;

pub use loader::{ConfigPaths, LoadOutcome};
pub use settings::{LoadOptions, RegistrySettings, SystemConfigSettings};
