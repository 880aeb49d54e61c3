//! Configuration loading from disk.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::config::merge::merge;
use crate::config::settings::LoadOptions;
use crate::config::validation::check_mandatory;
use crate::error::{ConfigError, Location, Result};
use crate::parser::Parser;
use crate::schema::Schema;
use crate::tables::FileTables;

/// Permission bits that make a configuration file unsafe to load.
pub const UNSAFE_MODE_MASK: u32 = 0o022;

/// Primary file plus an optional secondary that fills its gaps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    pub primary: PathBuf,
    pub secondary: Option<PathBuf>,
}

impl ConfigPaths {
    pub fn single(primary: impl Into<PathBuf>) -> Self {
        Self {
            primary: primary.into(),
            secondary: None,
        }
    }

    pub fn pair(primary: impl Into<PathBuf>, secondary: impl Into<PathBuf>) -> Self {
        Self {
            primary: primary.into(),
            secondary: Some(secondary.into()),
        }
    }

    /// Every configured path, primary first.
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.primary.as_path()).chain(self.secondary.as_deref())
    }
}

/// Result of loading one configuration from disk.
#[derive(Debug)]
pub struct LoadOutcome {
    pub tables: FileTables,
    pub primary_loaded: bool,
    pub secondary_loaded: bool,
}

/// Refuse files that group or others can write.
///
/// Only meaningful on unix; elsewhere every file passes.
pub fn check_file_safety(path: &Path, metadata: &fs::Metadata) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let mode = metadata.permissions().mode();
        if mode & UNSAFE_MODE_MASK != 0 {
            return Err(ConfigError::UnsafeFile {
                path: path.to_path_buf(),
                mode: mode & 0o7777,
            });
        }
    }
    #[cfg(not(unix))]
    let _ = (path, metadata);
    Ok(())
}

/// Read a configuration file, or `None` if it does not exist.
pub fn read_source(path: &Path) -> Result<Option<Vec<u8>>> {
    let io_error = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };

    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_error(e)),
    };
    check_file_safety(path, &metadata)?;

    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_error(e)),
    }
}

/// Parse one file without the mandatory block check.
pub fn parse_file(schema: &Schema, path: &Path) -> Result<Option<FileTables>> {
    let Some(bytes) = read_source(path)? else {
        return Ok(None);
    };
    let tables = Parser::new(schema, &bytes, Some(path)).parse(false)?;
    tracing::debug!(
        path = %path.display(),
        blocks = tables.block_names().count(),
        maps = tables.map_names().count(),
        "Parsed configuration file"
    );
    Ok(Some(tables))
}

/// Load, merge and validate the configuration named by `paths`.
///
/// With a single file, a missing file fails unless `tolerate_missing` is
/// set. With a pair, either or both files may be missing. A configuration
/// that loaded nothing is empty and skips the mandatory check.
pub fn load(schema: &Schema, paths: &ConfigPaths, options: &LoadOptions) -> Result<LoadOutcome> {
    let primary = parse_file(schema, &paths.primary)?;
    let secondary = match &paths.secondary {
        Some(path) => parse_file(schema, path)?,
        None => None,
    };

    let primary_loaded = primary.is_some();
    let secondary_loaded = secondary.is_some();

    if !primary_loaded && paths.secondary.is_none() && !options.tolerate_missing {
        return Err(ConfigError::MissingFile {
            path: paths.primary.clone(),
        });
    }
    for (path, loaded) in paths.iter().zip([primary_loaded, secondary_loaded]) {
        if !loaded {
            tracing::warn!(path = %path.display(), "Configuration file missing, continuing without it");
        }
    }

    let tables = match (primary, secondary) {
        (Some(p), Some(s)) => merge(p, s),
        (Some(p), None) => p,
        (None, Some(s)) => s,
        (None, None) => FileTables::new(),
    };

    if !options.skip_mandatory && (primary_loaded || secondary_loaded) {
        let origin = match (primary_loaded, &paths.secondary) {
            (false, Some(secondary)) => secondary.as_path(),
            _ => paths.primary.as_path(),
        };
        check_mandatory(schema, &tables, Location::file(Some(origin)))?;
    }

    Ok(LoadOutcome {
        tables,
        primary_loaded,
        secondary_loaded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{BlockDef, ParamDef, ValueType};
    use std::io::Write;

    fn schema() -> Schema {
        Schema::new(vec![BlockDef::block("system")
            .mandatory()
            .param(ParamDef::new("name", ValueType::String))])
        .unwrap()
    }

    fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(text.as_bytes()).unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
        }
        path
    }

    #[test]
    fn test_single_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ConfigPaths::single(dir.path().join("absent.conf"));

        let err = load(&schema(), &paths, &LoadOptions::default()).unwrap_err();
        assert!(err.is_missing_file());

        let outcome = load(
            &schema(),
            &paths,
            &LoadOptions::default().tolerate_missing(true),
        )
        .unwrap();
        assert!(outcome.tables.is_empty());
        assert!(!outcome.primary_loaded);
    }

    #[test]
    fn test_secondary_fills_mandatory_gap() {
        let dir = tempfile::tempdir().unwrap();
        let primary = write(dir.path(), "primary.conf", "# nothing here\n");
        let secondary = write(dir.path(), "secondary.conf", "system { name = \"s\"; }");

        let outcome = load(
            &schema(),
            &ConfigPaths::pair(&primary, &secondary),
            &LoadOptions::default(),
        )
        .unwrap();
        assert!(outcome.primary_loaded && outcome.secondary_loaded);
        assert!(outcome.tables.block("system").is_some());

        let err = load(&schema(), &ConfigPaths::single(&primary), &LoadOptions::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::MandatoryMissing { .. }));
    }

    #[test]
    fn test_pair_with_missing_secondary() {
        let dir = tempfile::tempdir().unwrap();
        let primary = write(dir.path(), "primary.conf", "system { }");
        let outcome = load(
            &schema(),
            &ConfigPaths::pair(&primary, dir.path().join("absent.conf")),
            &LoadOptions::default(),
        )
        .unwrap();
        assert!(outcome.primary_loaded);
        assert!(!outcome.secondary_loaded);
    }

    #[test]
    fn test_pair_with_nothing_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = load(
            &schema(),
            &ConfigPaths::pair(dir.path().join("a.conf"), dir.path().join("b.conf")),
            &LoadOptions::default(),
        )
        .unwrap();
        assert!(outcome.tables.is_empty());
        assert!(!outcome.primary_loaded && !outcome.secondary_loaded);
    }

    #[cfg(unix)]
    #[test]
    fn test_world_writable_rejected() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "primary.conf", "system { }");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o666)).unwrap();

        let err = load(
            &schema(),
            &ConfigPaths::single(&path),
            &LoadOptions::default().tolerate_missing(true),
        )
        .unwrap_err();
        match err {
            ConfigError::UnsafeFile { mode, .. } => assert_eq!(mode, 0o666),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_error_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "primary.conf", "system {\n  bogus = 1;\n}");
        let err = load(&schema(), &ConfigPaths::single(&path), &LoadOptions::default())
            .unwrap_err();
        let text = err.to_string();
        assert!(text.contains("primary.conf:2"), "{text}");
    }
}
