//! Error types for configuration loading.
//!
//! Every failure of an open or reload is reported through [`ConfigError`].
//! The typed accessors never produce errors; they fall back to the caller's
//! default instead.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::lexer::LexErrorKind;

/// Where in the configuration source an error was detected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    /// Source file, if the text came from disk.
    pub path: Option<PathBuf>,
    /// 1-based line number, if known.
    pub line: Option<u32>,
}

impl Location {
    /// A location pointing at a whole file.
    pub fn file(path: Option<&Path>) -> Self {
        Self {
            path: path.map(Path::to_path_buf),
            line: None,
        }
    }

    /// A location pointing at a line of a file.
    pub fn line(path: Option<&Path>, line: u32) -> Self {
        Self {
            path: path.map(Path::to_path_buf),
            line: Some(line),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}", path.display())?,
            None => write!(f, "<input>")?,
        }
        if let Some(line) = self.line {
            write!(f, ":{}", line)?;
        }
        Ok(())
    }
}

/// Errors that can occur while loading, merging or publishing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Open, stat or read failure other than a missing file.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file does not exist and missing files are not tolerated.
    #[error("configuration file not found: {}", path.display())]
    MissingFile { path: PathBuf },

    /// The file is writable by group or others.
    #[error("refusing to load {}: mode {mode:o} grants group/world write", path.display())]
    UnsafeFile { path: PathBuf, mode: u32 },

    /// Malformed token.
    #[error("{location}: {kind}")]
    Lex {
        location: Location,
        kind: LexErrorKind,
    },

    /// Integer literal does not fit in 64 bits.
    #[error("{location}: integer literal overflows 64 bits")]
    Overflow { location: Location },

    /// Unknown or duplicate name, wrong token, wrong arity, out-of-range value.
    #[error("{location}: {message}")]
    Schema { location: Location, message: String },

    /// A mandatory parameter, block or map is absent after the load.
    #[error("{location}: mandatory {what} is missing")]
    MandatoryMissing { location: Location, what: String },

    /// Every handle id is in use.
    #[error("handle registry exhausted ({live} live handles)")]
    HandleExhausted { live: usize },

    /// Memory for a value could not be reserved.
    #[error("allocation failed: {0}")]
    Allocation(String),

    /// The always-resident system configuration cannot be closed.
    #[error("the system configuration cannot be closed")]
    SystemConfig,

    /// The file handle was closed.
    #[error("configuration file handle is closed")]
    Closed,

    /// The global registry has not been initialized.
    #[error("configuration registry is not initialized")]
    NotInitialized,

    /// Invalid registry settings or schema document.
    #[error("settings error: {0}")]
    Settings(#[from] toml::de::Error),

    /// Invalid schema definition supplied by the embedding application.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// File watcher failure.
    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),
}

impl ConfigError {
    pub(crate) fn schema(location: Location, message: impl Into<String>) -> Self {
        ConfigError::Schema {
            location,
            message: message.into(),
        }
    }

    pub(crate) fn lex(location: Location, kind: LexErrorKind) -> Self {
        match kind {
            LexErrorKind::Overflow => ConfigError::Overflow { location },
            kind => ConfigError::Lex { location, kind },
        }
    }

    /// Whether the error is a tolerable missing file.
    pub fn is_missing_file(&self) -> bool {
        matches!(self, ConfigError::MissingFile { .. })
    }
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
