//! Block instances, map entries and per-file tables.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::handles::Handle;
use super::value::ParamValue;

/// One parsed block: a plain block or one keyed member of a map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockInstance {
    /// Block name, or the key for a map member.
    pub name: String,
    /// Registry handle, assigned only when the owning file is exported.
    pub handle: Option<Handle>,
    params: BTreeMap<String, ParamValue>,
}

impl BlockInstance {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handle: None,
            params: BTreeMap::new(),
        }
    }

    /// Insert a parameter unless one with the same name already exists.
    ///
    /// On conflict the rejected value is handed back.
    pub fn insert_param(
        &mut self,
        name: impl Into<String>,
        value: ParamValue,
    ) -> Result<(), ParamValue> {
        match self.params.entry(name.into()) {
            Entry::Vacant(slot) => {
                slot.insert(value);
                Ok(())
            }
            Entry::Occupied(_) => Err(value),
        }
    }

    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.params.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    /// Parameter names in sorted order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// All keyed blocks sharing one map name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapEntry {
    pub name: String,
    keys: Vec<String>,
    entries: BTreeMap<String, Arc<BlockInstance>>,
}

impl MapEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keys: Vec::new(),
            entries: BTreeMap::new(),
        }
    }

    /// Add a keyed block unless the key is already present.
    pub fn insert(&mut self, block: BlockInstance) -> Result<(), BlockInstance> {
        self.insert_shared(Arc::new(block))
            .map_err(|b| Arc::try_unwrap(b).unwrap_or_else(|b| (*b).clone()))
    }

    pub(crate) fn insert_shared(
        &mut self,
        block: Arc<BlockInstance>,
    ) -> Result<(), Arc<BlockInstance>> {
        match self.entries.entry(block.name.clone()) {
            Entry::Vacant(slot) => {
                self.keys.push(block.name.clone());
                slot.insert(block);
                Ok(())
            }
            Entry::Occupied(_) => Err(block),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Arc<BlockInstance>> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys in the order they were first seen.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the entry, yielding members in key order of first appearance.
    pub(crate) fn into_members(self) -> impl Iterator<Item = Arc<BlockInstance>> {
        let mut entries = self.entries;
        self.keys
            .into_iter()
            .filter_map(move |key| entries.remove(&key))
    }

    fn members_mut(&mut self) -> impl Iterator<Item = &mut Arc<BlockInstance>> {
        self.entries.values_mut()
    }
}

/// Everything parsed from one configuration (one file or a merged pair).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileTables {
    blocks: BTreeMap<String, Arc<BlockInstance>>,
    maps: BTreeMap<String, MapEntry>,
}

impl FileTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a plain block unless one with the same name exists.
    pub fn insert_block(&mut self, block: BlockInstance) -> Result<(), BlockInstance> {
        match self.blocks.entry(block.name.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(block));
                Ok(())
            }
            Entry::Occupied(_) => Err(block),
        }
    }

    pub(crate) fn insert_shared_block(
        &mut self,
        block: Arc<BlockInstance>,
    ) -> Result<(), Arc<BlockInstance>> {
        match self.blocks.entry(block.name.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(block);
                Ok(())
            }
            Entry::Occupied(_) => Err(block),
        }
    }

    pub fn block(&self, name: &str) -> Option<&Arc<BlockInstance>> {
        self.blocks.get(name)
    }

    pub fn contains_block(&self, name: &str) -> bool {
        self.blocks.contains_key(name)
    }

    /// The map entry for `name`, created on first use.
    pub fn map_entry_mut(&mut self, name: &str) -> &mut MapEntry {
        self.maps
            .entry(name.to_string())
            .or_insert_with(|| MapEntry::new(name))
    }

    pub fn map(&self, name: &str) -> Option<&MapEntry> {
        self.maps.get(name)
    }

    pub(crate) fn insert_map(&mut self, entry: MapEntry) -> Result<(), MapEntry> {
        match self.maps.entry(entry.name.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(entry);
                Ok(())
            }
            Entry::Occupied(_) => Err(entry),
        }
    }

    pub fn block_names(&self) -> impl Iterator<Item = &str> {
        self.blocks.keys().map(String::as_str)
    }

    pub fn map_names(&self) -> impl Iterator<Item = &str> {
        self.maps.keys().map(String::as_str)
    }

    /// Whether a plain block or map with this name has at least one instance.
    pub fn has_instance(&self, name: &str) -> bool {
        self.blocks.contains_key(name) || self.maps.get(name).is_some_and(|m| !m.is_empty())
    }

    /// Every block instance: plain blocks first, then map members.
    pub fn instances(&self) -> impl Iterator<Item = &Arc<BlockInstance>> {
        self.blocks
            .values()
            .chain(self.maps.values().flat_map(|m| m.entries.values()))
    }

    pub(crate) fn instances_mut(&mut self) -> impl Iterator<Item = &mut Arc<BlockInstance>> {
        self.blocks
            .values_mut()
            .chain(self.maps.values_mut().flat_map(MapEntry::members_mut))
    }

    pub(crate) fn into_parts(
        self,
    ) -> (BTreeMap<String, Arc<BlockInstance>>, BTreeMap<String, MapEntry>) {
        (self.blocks, self.maps)
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty() && self.maps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::value::Scalar;

    #[test]
    fn test_duplicate_param_rejected() {
        let mut block = BlockInstance::new("system");
        block
            .insert_param("debug", ParamValue::scalar(Scalar::Bool(true)))
            .unwrap();
        let rejected = block
            .insert_param("debug", ParamValue::scalar(Scalar::Bool(false)))
            .unwrap_err();
        assert_eq!(rejected, ParamValue::scalar(Scalar::Bool(false)));
        assert_eq!(block.len(), 1);
    }

    #[test]
    fn test_map_keys_keep_insertion_order() {
        let mut entry = MapEntry::new("bridge");
        for key in ["zeta", "alpha", "mid"] {
            entry.insert(BlockInstance::new(key)).unwrap();
        }
        assert!(entry.insert(BlockInstance::new("alpha")).is_err());
        assert_eq!(entry.keys(), ["zeta", "alpha", "mid"]);

        let order: Vec<_> = entry.into_members().map(|b| b.name.clone()).collect();
        assert_eq!(order, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_file_tables() {
        let mut tables = FileTables::new();
        tables.insert_block(BlockInstance::new("system")).unwrap();
        assert!(tables.insert_block(BlockInstance::new("system")).is_err());

        tables
            .map_entry_mut("bridge")
            .insert(BlockInstance::new("br0"))
            .unwrap();
        tables
            .map_entry_mut("bridge")
            .insert(BlockInstance::new("br1"))
            .unwrap();

        assert!(tables.has_instance("system"));
        assert!(tables.has_instance("bridge"));
        assert!(!tables.has_instance("port"));
        assert_eq!(tables.instances().count(), 3);
        assert_eq!(tables.map("bridge").unwrap().keys(), ["br0", "br1"]);
    }
}
