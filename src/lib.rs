//! Schema-driven block configuration loader with a shared handle registry.
//!
//! # Data Flow
//! ```text
//! file bytes → lexer (tokens) → parser + schema (FileTables)
//!     → merge (primary wins over secondary) → mandatory check
//!     → registry (handles) → typed getters with defaults
//! ```

pub mod config;
pub mod error;
pub mod lexer;
pub mod lifecycle;
pub mod observability;
pub mod parser;
pub mod registry;
pub mod schema;
pub mod tables;

pub use config::{ConfigPaths, LoadOptions, RegistrySettings};
pub use error::{ConfigError, Location, Result};
pub use parser::parse_str;
pub use registry::{ConfigFile, ConfigRegistry};
pub use schema::{BlockDef, ParamDef, Schema, ValueType};
pub use tables::{BlockInstance, Handle};
