//! Symbol tables holding parsed configuration.
//!
//! # Data Flow
//! ```text
//! parser
//!     → ParamValue (typed, range-checked)
//!     → BlockInstance (name → ParamValue)
//!     → FileTables (block name → instance, map name → MapEntry)
//!     → HandleTable (handle → instance) once exported
//! ```
//!
//! # Design Decisions
//! - Ordered maps everywhere so iteration and error reporting are deterministic
//! - Block instances are `Arc`-shared between their file and the handle table;
//!   the file owns them, the handle table only points at them
//! - Map entries keep a separate insertion-order key list for enumeration

pub mod block;
pub mod handles;
pub mod value;

pub use block::{BlockInstance, FileTables, MapEntry};
pub use handles::{Handle, HandleTable};
pub use value::{ArrayValue, ParamValue, Scalar, Value};
