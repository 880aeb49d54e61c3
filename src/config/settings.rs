//! Settings for the loader and the global registry.
//!
//! Settings are TOML; every field has a default so an empty document is
//! valid.
//!
//! ```toml
//! handle_limit = 65535
//! install_fork_hooks = true
//!
//! [system]
//! primary = "/etc/ctl/system.conf"
//! secondary = "/etc/ctl/system.local.conf"
//!
//! [system.options]
//! tolerate_missing = true
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Per-call open policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Treat a missing file as empty instead of failing.
    pub tolerate_missing: bool,
    /// Register every resulting block in the handle registry.
    pub export: bool,
    /// Skip the mandatory block/map check after loading.
    pub skip_mandatory: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            tolerate_missing: false,
            export: true,
            skip_mandatory: false,
        }
    }
}

impl LoadOptions {
    pub fn tolerate_missing(mut self, yes: bool) -> Self {
        self.tolerate_missing = yes;
        self
    }

    pub fn export(mut self, yes: bool) -> Self {
        self.export = yes;
        self
    }

    pub fn skip_mandatory(mut self, yes: bool) -> Self {
        self.skip_mandatory = yes;
        self
    }
}

/// The always-resident system configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SystemConfigSettings {
    pub primary: PathBuf,
    #[serde(default)]
    pub secondary: Option<PathBuf>,
    #[serde(default)]
    pub options: LoadOptions,
}

/// Settings for [`crate::lifecycle::init`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistrySettings {
    /// Largest handle id the registry hands out.
    pub handle_limit: u32,
    /// Register the fork hooks with `pthread_atfork` (unix only).
    pub install_fork_hooks: bool,
    /// System configuration opened at init and never closed.
    pub system: Option<SystemConfigSettings>,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            handle_limit: u32::MAX,
            install_fork_hooks: true,
            system: None,
        }
    }
}

impl RegistrySettings {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_settings_use_defaults() {
        let settings = RegistrySettings::from_toml_str("").unwrap();
        assert_eq!(settings, RegistrySettings::default());
        assert!(LoadOptions::default().export);
    }

    #[test]
    fn test_system_section() {
        let settings = RegistrySettings::from_toml_str(
            r#"
            handle_limit = 100
            install_fork_hooks = false

            [system]
            primary = "/etc/ctl/system.conf"

            [system.options]
            tolerate_missing = true
            "#,
        )
        .unwrap();
        assert_eq!(settings.handle_limit, 100);
        let system = settings.system.unwrap();
        assert_eq!(system.primary, PathBuf::from("/etc/ctl/system.conf"));
        assert_eq!(system.secondary, None);
        assert!(system.options.tolerate_missing);
        assert!(system.options.export);
    }

    #[test]
    fn test_bad_settings() {
        let err = RegistrySettings::from_toml_str("handle_limit = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::Settings(_)));
    }
}
