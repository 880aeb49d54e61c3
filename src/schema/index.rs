//! Name lookup tables built for the duration of one parse.

use std::collections::HashMap;

use super::{BlockDef, ParamDef, Schema};

/// Parameter lookup for a single block definition.
#[derive(Debug)]
pub struct BlockIndex<'s> {
    pub def: &'s BlockDef,
    params: HashMap<&'s str, &'s ParamDef>,
}

impl<'s> BlockIndex<'s> {
    fn new(def: &'s BlockDef) -> Self {
        let params = def.params.iter().map(|p| (p.name.as_str(), p)).collect();
        Self { def, params }
    }

    pub fn param(&self, name: &str) -> Option<&'s ParamDef> {
        self.params.get(name).copied()
    }

    /// Mandatory parameters of this block.
    pub fn mandatory_params(&self) -> impl Iterator<Item = &'s ParamDef> + '_ {
        self.def.params.iter().filter(|p| p.mandatory)
    }
}

/// Block and map lookup for a whole schema.
#[derive(Debug)]
pub struct SchemaIndex<'s> {
    blocks: HashMap<&'s str, BlockIndex<'s>>,
}

impl<'s> SchemaIndex<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        let blocks = schema
            .blocks()
            .iter()
            .map(|def| (def.name.as_str(), BlockIndex::new(def)))
            .collect();
        Self { blocks }
    }

    /// Resolve a top-level keyword to its block or map definition.
    pub fn lookup(&self, name: &str) -> Option<&BlockIndex<'s>> {
        self.blocks.get(name)
    }
}
