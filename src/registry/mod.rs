//! Handle registry and file lifecycle.
//!
//! # Responsibilities
//! - Open one or two files into a [`ConfigFile`] and publish its blocks
//! - Close a file, removing its handles before its tables are freed
//! - Reload from scratch and swap the result in atomically
//! - Serve typed reads by handle under a shared lock
//!
//! # Design Decisions
//! - One reader/writer lock guards the handle table; writers hold it only
//!   for registration and the swap, never across file I/O or parsing
//! - A file's tables live behind an `ArcSwap`: readers that fetched the old
//!   snapshot keep it alive until they drop it
//! - The old snapshot is dropped only after the writer lock is released

mod accessor;

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use arc_swap::ArcSwap;
use parking_lot::{Mutex, RwLock};

use crate::config::loader::{self, ConfigPaths, LoadOutcome};
use crate::config::settings::LoadOptions;
use crate::error::{ConfigError, Result};
use crate::observability::metrics;
use crate::schema::Schema;
use crate::tables::{BlockInstance, FileTables, Handle, HandleTable};

pub use accessor::ArrayElement;

/// One published generation of a file's contents.
#[derive(Debug, Default)]
pub struct FileState {
    pub tables: FileTables,
    pub primary_loaded: bool,
    pub secondary_loaded: bool,
    exported: Vec<Handle>,
}

impl FileState {
    fn from_outcome(outcome: LoadOutcome) -> Self {
        Self {
            tables: outcome.tables,
            primary_loaded: outcome.primary_loaded,
            secondary_loaded: outcome.secondary_loaded,
            exported: Vec::new(),
        }
    }

    /// Handles registered for this generation.
    pub fn exported(&self) -> &[Handle] {
        &self.exported
    }
}

#[derive(Debug)]
struct FileInner {
    id: u64,
    schema: Arc<Schema>,
    paths: ConfigPaths,
    options: LoadOptions,
    state: ArcSwap<FileState>,
    closed: AtomicBool,
}

/// An open configuration: one file or a merged primary/secondary pair.
///
/// Cloning is cheap and every clone refers to the same configuration; a
/// reload through any clone is visible through all of them.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    inner: Arc<FileInner>,
}

impl ConfigFile {
    pub fn paths(&self) -> &ConfigPaths {
        &self.inner.paths
    }

    pub fn options(&self) -> &LoadOptions {
        &self.inner.options
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.inner.schema
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// The currently published contents.
    pub fn snapshot(&self) -> Arc<FileState> {
        self.inner.state.load_full()
    }

    /// Whether both values refer to the same open configuration.
    pub fn same_file(&self, other: &ConfigFile) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Process-wide table of published blocks.
#[derive(Debug)]
pub struct ConfigRegistry {
    table: RwLock<HandleTable>,
    system: Mutex<Option<ConfigFile>>,
    /// Files whose handles live in `table`, by file id.
    files: Mutex<BTreeMap<u64, Weak<FileInner>>>,
    fork_locked: AtomicBool,
    next_file_id: AtomicU64,
}

impl Default for ConfigRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigRegistry {
    pub fn new() -> Self {
        Self::with_handle_limit(u32::MAX)
    }

    /// A registry whose handle ids never exceed `limit`.
    pub fn with_handle_limit(limit: u32) -> Self {
        Self {
            table: RwLock::new(HandleTable::with_limit(limit)),
            system: Mutex::new(None),
            files: Mutex::new(BTreeMap::new()),
            fork_locked: AtomicBool::new(false),
            next_file_id: AtomicU64::new(1),
        }
    }

    /// Open a single configuration file.
    pub fn open(
        &self,
        schema: Arc<Schema>,
        path: impl Into<std::path::PathBuf>,
        options: LoadOptions,
    ) -> Result<ConfigFile> {
        self.open_paths(schema, ConfigPaths::single(path), options)
    }

    /// Open a primary file merged with a secondary one (primary wins).
    pub fn open_pair(
        &self,
        schema: Arc<Schema>,
        primary: impl Into<std::path::PathBuf>,
        secondary: impl Into<std::path::PathBuf>,
        options: LoadOptions,
    ) -> Result<ConfigFile> {
        self.open_paths(schema, ConfigPaths::pair(primary, secondary), options)
    }

    /// Load `paths` and, unless `options.export` is off, publish every block.
    pub fn open_paths(
        &self,
        schema: Arc<Schema>,
        paths: ConfigPaths,
        options: LoadOptions,
    ) -> Result<ConfigFile> {
        let outcome = loader::load(&schema, &paths, &options).inspect_err(|e| {
            metrics::record_load("error");
            tracing::warn!(path = %paths.primary.display(), error = %e, "Configuration load failed");
        })?;
        let mut state = FileState::from_outcome(outcome);
        let inner = Arc::new(FileInner {
            id: self.next_file_id.fetch_add(1, Ordering::Relaxed),
            schema,
            paths,
            options,
            state: ArcSwap::from_pointee(FileState::default()),
            closed: AtomicBool::new(false),
        });

        {
            let mut table = self.table.write();
            if options.export {
                state.exported = publish(&mut table, &mut state.tables).inspect_err(|_| {
                    metrics::record_load("error");
                })?;
                metrics::set_registered_handles(table.len());
            }
            let handles = state.exported.len();
            inner.state.store(Arc::new(state));

            let mut files = self.files.lock();
            files.retain(|_, file| file.strong_count() > 0);
            files.insert(inner.id, Arc::downgrade(&inner));

            metrics::record_load("ok");
            tracing::info!(
                file = inner.id,
                path = %inner.paths.primary.display(),
                secondary = ?inner.paths.secondary,
                handles,
                "Configuration opened"
            );
        }

        Ok(ConfigFile { inner })
    }

    /// Mark `file` as the always-resident system configuration.
    pub fn set_system_file(&self, file: ConfigFile) {
        *self.system.lock() = Some(file);
    }

    pub fn system_file(&self) -> Option<ConfigFile> {
        self.system.lock().clone()
    }

    fn is_system_file(&self, file: &ConfigFile) -> bool {
        self.system
            .lock()
            .as_ref()
            .is_some_and(|system| system.same_file(file))
    }

    /// Unregister every handle `file` owns, then free its tables.
    pub fn close(&self, file: ConfigFile) -> Result<()> {
        if self.is_system_file(&file) {
            return Err(ConfigError::SystemConfig);
        }
        if file.inner.closed.swap(true, Ordering::AcqRel) {
            return Err(ConfigError::Closed);
        }

        let old = {
            let mut table = self.table.write();
            let old = file.inner.state.swap(Arc::new(FileState::default()));
            for handle in &old.exported {
                table.unregister(*handle);
            }
            self.files.lock().remove(&file.inner.id);
            metrics::set_registered_handles(table.len());
            old
        };

        tracing::info!(
            file = file.inner.id,
            path = %file.inner.paths.primary.display(),
            handles = old.exported.len(),
            "Configuration closed"
        );
        drop(old);
        Ok(())
    }

    /// Re-read `file` from disk and replace its contents.
    ///
    /// The new configuration is parsed completely before any lock is taken.
    /// On failure the current configuration stays published untouched.
    pub fn reload(&self, file: &ConfigFile) -> Result<()> {
        if file.is_closed() {
            return Err(ConfigError::Closed);
        }
        let inner = &file.inner;

        let outcome = loader::load(&inner.schema, &inner.paths, &inner.options).inspect_err(|e| {
            metrics::record_reload("error");
            tracing::warn!(
                path = %inner.paths.primary.display(),
                error = %e,
                "Reload rejected, keeping current configuration"
            );
        })?;
        let mut state = FileState::from_outcome(outcome);

        let old = {
            let mut table = self.table.write();
            if inner.closed.load(Ordering::Acquire) {
                return Err(ConfigError::Closed);
            }
            if inner.options.export {
                state.exported = publish(&mut table, &mut state.tables).inspect_err(|_| {
                    metrics::record_reload("error");
                })?;
            }
            let old = inner.state.swap(Arc::new(state));
            for handle in &old.exported {
                table.unregister(*handle);
            }
            metrics::set_registered_handles(table.len());
            old
        };

        metrics::record_reload("ok");
        tracing::info!(
            file = inner.id,
            path = %inner.paths.primary.display(),
            retired_handles = old.exported.len(),
            "Configuration reloaded"
        );
        drop(old);
        Ok(())
    }

    /// Number of live handles.
    pub fn handle_count(&self) -> usize {
        self.table.read().len()
    }

    /// The block published under `handle`.
    ///
    /// The returned instance stays valid after a reload or close; it is
    /// simply no longer reachable through the registry.
    pub fn block(&self, handle: Handle) -> Option<Arc<BlockInstance>> {
        self.table.read().get(handle).cloned()
    }

    /// Handle of plain block `name` in `file`.
    pub fn block_handle(&self, file: &ConfigFile, name: &str) -> Option<Handle> {
        let _guard = self.table.read();
        file.inner.state.load().tables.block(name).and_then(|b| b.handle)
    }

    /// Handle of the member `key` of map `map` in `file`.
    pub fn map_handle(&self, file: &ConfigFile, map: &str, key: &str) -> Option<Handle> {
        let _guard = self.table.read();
        file.inner
            .state
            .load()
            .tables
            .map(map)
            .and_then(|m| m.get(key))
            .and_then(|b| b.handle)
    }

    /// Keys of map `map` in `file`, in the order they were defined.
    pub fn map_keys(&self, file: &ConfigFile, map: &str) -> Vec<String> {
        let _guard = self.table.read();
        file.inner
            .state
            .load()
            .tables
            .map(map)
            .map(|m| m.keys().to_vec())
            .unwrap_or_default()
    }

    /// Names of plain blocks present in `file`.
    pub fn block_names(&self, file: &ConfigFile) -> Vec<String> {
        let _guard = self.table.read();
        file.inner
            .state
            .load()
            .tables
            .block_names()
            .map(str::to_string)
            .collect()
    }

    /// Close every open file, drop every handle and forget the system
    /// configuration.
    ///
    /// Files opened before the call report [`ConfigError::Closed`] from
    /// then on, so none of them can later unregister a reissued handle.
    pub fn shutdown(&self) {
        let system = self.system.lock().take();
        let mut removed = 0usize;
        let retired: Vec<Arc<FileState>> = {
            let mut table = self.table.write();
            table.clear_with(|_, _| removed += 1);
            metrics::set_registered_handles(0);

            let files = std::mem::take(&mut *self.files.lock());
            files
                .into_values()
                .filter_map(|file| file.upgrade())
                .map(|file| {
                    file.closed.store(true, Ordering::Release);
                    file.state.swap(Arc::new(FileState::default()))
                })
                .collect()
        };
        drop(system);
        tracing::info!(
            handles = removed,
            files = retired.len(),
            "Configuration registry shut down"
        );
        drop(retired);
    }

    /// Acquire every registry lock ahead of `fork`.
    pub(crate) fn lock_for_fork(&self) {
        std::mem::forget(self.system.lock());
        std::mem::forget(self.table.write());
        std::mem::forget(self.files.lock());
        self.fork_locked.store(true, Ordering::Release);
    }

    /// Release the locks taken by [`ConfigRegistry::lock_for_fork`].
    pub(crate) fn unlock_after_fork(&self) {
        if !self.fork_locked.swap(false, Ordering::AcqRel) {
            return;
        }
        // SAFETY: lock_for_fork leaked exactly one write guard and two mutex
        // guards on this registry, and fork_locked proves it ran.
        unsafe {
            self.files.force_unlock();
            self.table.force_unlock_write();
            self.system.force_unlock();
        }
    }
}

/// Register every instance of `tables`, all or nothing.
fn publish(table: &mut HandleTable, tables: &mut FileTables) -> Result<Vec<Handle>> {
    let mut registered = Vec::new();
    for block in tables.instances_mut() {
        match table.register(block) {
            Ok(handle) => registered.push(handle),
            Err(e) => {
                for handle in registered {
                    table.unregister(handle);
                }
                return Err(e);
            }
        }
    }
    Ok(registered)
}
