//! Process-wide registry lifecycle.
//!
//! # Data Flow
//! ```text
//! init(settings, schema):
//!     Build registry → Open system configuration → Install fork hooks → Publish
//!
//! global():
//!     → Shared registry, or NotInitialized
//!
//! shutdown():
//!     Unpublish → Drop every handle → Forget system configuration
//!
//! fork (fork.rs):
//!     prepare_fork → fork() → after_fork_parent / after_fork_child
//! ```
//!
//! # Design Decisions
//! - An explicit `ConfigRegistry` can always be used without the global one
//! - `init` is idempotent: a second call returns the registry already installed
//! - The system configuration is opened before the registry is published, so
//!   no reader can see a half-initialized global

mod fork;

use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::settings::RegistrySettings;
use crate::error::{ConfigError, Result};
use crate::registry::ConfigRegistry;
use crate::schema::Schema;

pub use fork::{after_fork_child, after_fork_parent, install_fork_hooks, prepare_fork};

static GLOBAL: RwLock<Option<Arc<ConfigRegistry>>> = parking_lot::const_rwlock(None);

/// Build and install the global registry.
///
/// `system_schema` is required when `settings.system` names a system
/// configuration; that configuration is opened, exported and marked as
/// never closable.
pub fn init(
    settings: &RegistrySettings,
    system_schema: Option<Arc<Schema>>,
) -> Result<Arc<ConfigRegistry>> {
    let mut global = GLOBAL.write();
    if let Some(existing) = global.as_ref() {
        tracing::debug!("Configuration registry already initialized");
        return Ok(Arc::clone(existing));
    }

    let registry = Arc::new(ConfigRegistry::with_handle_limit(settings.handle_limit));

    if let Some(system) = &settings.system {
        let schema = system_schema.ok_or_else(|| {
            ConfigError::InvalidSchema("a system configuration needs a schema".to_string())
        })?;
        let paths = crate::config::ConfigPaths {
            primary: system.primary.clone(),
            secondary: system.secondary.clone(),
        };
        let file = registry.open_paths(schema, paths, system.options)?;
        registry.set_system_file(file);
    }

    if settings.install_fork_hooks && !install_fork_hooks() {
        tracing::warn!("Fork hooks could not be installed");
    }

    tracing::info!(
        handle_limit = settings.handle_limit,
        system = settings.system.is_some(),
        "Configuration registry initialized"
    );
    *global = Some(Arc::clone(&registry));
    Ok(registry)
}

/// The registry installed by [`init`].
pub fn global() -> Result<Arc<ConfigRegistry>> {
    GLOBAL.read().clone().ok_or(ConfigError::NotInitialized)
}

/// Tear down the global registry.
///
/// Clones of the registry obtained earlier stay usable but hold no handles.
pub fn shutdown() {
    let registry = GLOBAL.write().take();
    match registry {
        Some(registry) => registry.shutdown(),
        None => tracing::debug!("Configuration registry shutdown without init"),
    }
}
