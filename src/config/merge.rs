//! Two-file merge with primary-wins semantics.

use crate::tables::FileTables;

/// Fold `secondary` into `primary`.
///
/// Plain blocks and map keys present in both are taken from `primary`; the
/// secondary copies are dropped. Keys new to a map are appended to its key
/// order in the order the secondary file listed them.
pub fn merge(mut primary: FileTables, secondary: FileTables) -> FileTables {
    let (blocks, maps) = secondary.into_parts();

    for (name, block) in blocks {
        if primary.insert_shared_block(block).is_err() {
            tracing::debug!(block = %name, "secondary block shadowed by primary");
        }
    }

    for (name, entry) in maps {
        let Err(entry) = primary.insert_map(entry) else {
            continue;
        };
        let target = primary.map_entry_mut(&name);
        for member in entry.into_members() {
            if let Err(dup) = target.insert_shared(member) {
                tracing::debug!(map = %name, key = %dup.name, "secondary map key shadowed by primary");
            }
        }
    }

    primary
}
