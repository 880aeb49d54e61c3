//! Fork hooks for the global registry.
//!
//! `prepare_fork` takes every lock the registry owns so that no other
//! thread holds one at the instant of `fork`; the parent and the child
//! each release them afterwards. On platforms without `fork` these are
//! no-ops and [`install_fork_hooks`] does nothing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;

use super::GLOBAL;
use crate::registry::ConfigRegistry;

static PREPARED: AtomicBool = AtomicBool::new(false);
static FORKING: ArcSwapOption<ConfigRegistry> = ArcSwapOption::const_empty();

/// Acquire the global and registry locks ahead of `fork`.
pub fn prepare_fork() {
    let global = GLOBAL.write();
    if let Some(registry) = global.as_ref() {
        registry.lock_for_fork();
        FORKING.store(Some(Arc::clone(registry)));
    }
    std::mem::forget(global);
    PREPARED.store(true, Ordering::Release);
}

fn release() {
    if !PREPARED.swap(false, Ordering::AcqRel) {
        return;
    }
    if let Some(registry) = FORKING.swap(None) {
        registry.unlock_after_fork();
    }
    // SAFETY: prepare_fork leaked exactly one write guard, and PREPARED
    // proves it ran.
    unsafe { GLOBAL.force_unlock_write() };
}

/// Release the locks in the parent once `fork` returns.
pub fn after_fork_parent() {
    release();
}

/// Release the locks in the child once `fork` returns.
///
/// The child is single-threaded, so no other thread can be waiting on
/// the released locks.
pub fn after_fork_child() {
    release();
}

#[cfg(unix)]
extern "C" fn prepare_hook() {
    prepare_fork();
}

#[cfg(unix)]
extern "C" fn parent_hook() {
    after_fork_parent();
}

#[cfg(unix)]
extern "C" fn child_hook() {
    after_fork_child();
}

/// Register the hooks with `pthread_atfork` once per process.
///
/// Returns `false` if registration failed.
#[cfg(unix)]
pub fn install_fork_hooks() -> bool {
    static INSTALLED: std::sync::OnceLock<bool> = std::sync::OnceLock::new();

    *INSTALLED.get_or_init(|| {
        // SAFETY: the hooks are plain functions that live for the whole
        // process and only touch statics.
        let rc = unsafe { libc::pthread_atfork(Some(prepare_hook), Some(parent_hook), Some(child_hook)) };
        if rc != 0 {
            tracing::error!(code = rc, "pthread_atfork failed");
            return false;
        }
        tracing::debug!("Fork hooks installed");
        true
    })
}

#[cfg(not(unix))]
pub fn install_fork_hooks() -> bool {
    true
}
