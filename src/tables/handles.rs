//! Opaque handle allocation for published block instances.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::block::BlockInstance;
use crate::error::{ConfigError, Result};

/// Small integer naming a published block instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(u32);

impl Handle {
    /// Never assigned to a block.
    pub const INVALID: Handle = Handle(0);

    pub fn from_raw(raw: u32) -> Self {
        Handle(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn is_valid(self) -> bool {
        self != Handle::INVALID
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle → block instance map with wraparound id reuse.
///
/// Ids run from 1 to `limit`; the allocator walks forward from the last
/// issued id and skips ids still in use, giving up after one full cycle.
#[derive(Debug)]
pub struct HandleTable {
    entries: BTreeMap<Handle, Arc<BlockInstance>>,
    next: u32,
    limit: u32,
}

impl Default for HandleTable {
    fn default() -> Self {
        Self::with_limit(u32::MAX)
    }
}

impl HandleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table whose ids never exceed `limit` (at least 1).
    pub fn with_limit(limit: u32) -> Self {
        Self {
            entries: BTreeMap::new(),
            next: 1,
            limit: limit.max(1),
        }
    }

    fn advance(&mut self) -> u32 {
        let id = self.next;
        self.next = if self.next >= self.limit { 1 } else { self.next + 1 };
        id
    }

    /// Assign a fresh handle to `block` and publish it.
    ///
    /// The instance must not be shared yet; its `handle` field is set
    /// before it is inserted.
    pub fn register(&mut self, block: &mut Arc<BlockInstance>) -> Result<Handle> {
        for _ in 0..self.limit {
            let handle = Handle(self.advance());
            if self.entries.contains_key(&handle) {
                continue;
            }
            Arc::make_mut(block).handle = Some(handle);
            self.entries.insert(handle, Arc::clone(block));
            return Ok(handle);
        }
        Err(ConfigError::HandleExhausted {
            live: self.entries.len(),
        })
    }

    pub fn unregister(&mut self, handle: Handle) -> Option<Arc<BlockInstance>> {
        self.entries.remove(&handle)
    }

    pub fn get(&self, handle: Handle) -> Option<&Arc<BlockInstance>> {
        self.entries.get(&handle)
    }

    /// Lowest live handle.
    pub fn first(&self) -> Option<Handle> {
        self.entries.keys().next().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every entry, passing each to `on_remove`.
    pub fn clear_with(&mut self, mut on_remove: impl FnMut(Handle, Arc<BlockInstance>)) {
        for (handle, block) in std::mem::take(&mut self.entries) {
            on_remove(handle, block);
        }
    }
}
