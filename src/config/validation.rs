//! Mandatory block and map completeness.
//!
//! # Responsibilities
//! - Verify every schema block or map flagged mandatory has an instance
//! - Run once per load, after merge, on the combined tables
//!
//! Mandatory parameters inside a block are checked by the parser when the
//! block closes, since they never depend on the other file.

use crate::error::{ConfigError, Location, Result};
use crate::schema::Schema;
use crate::tables::FileTables;

/// Fail with [`ConfigError::MandatoryMissing`] for the first mandatory
/// block or map (in schema order) without an instance.
pub fn check_mandatory(schema: &Schema, tables: &FileTables, location: Location) -> Result<()> {
    for def in schema.blocks().iter().filter(|d| d.mandatory) {
        if !tables.has_instance(&def.name) {
            let kind = if def.is_map { "map" } else { "block" };
            return Err(ConfigError::MandatoryMissing {
                location,
                what: format!("{} '{}'", kind, def.name),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::BlockDef;
    use crate::tables::BlockInstance;

    #[test]
    fn test_mandatory_map_needs_a_member() {
        let schema = Schema::new(vec![BlockDef::map("bridge").mandatory()]).unwrap();
        let mut tables = FileTables::new();

        let err = check_mandatory(&schema, &tables, Location::default()).unwrap_err();
        assert!(err.to_string().contains("mandatory map 'bridge' is missing"));

        tables
            .map_entry_mut("bridge")
            .insert(BlockInstance::new("br0"))
            .unwrap();
        check_mandatory(&schema, &tables, Location::default()).unwrap();
    }

    #[test]
    fn test_optional_blocks_ignored() {
        let schema = Schema::new(vec![BlockDef::block("extra")]).unwrap();
        check_mandatory(&schema, &FileTables::new(), Location::default()).unwrap();
    }
}
