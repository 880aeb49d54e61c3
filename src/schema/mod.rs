//! Schema model supplied by the embedding application.
//!
//! A schema lists every block and map a configuration dialect accepts, and
//! for each the parameters it may contain with their type, shape, bounds
//! and mandatory flag. Schemas are immutable once built and are shared via
//! `Arc` by every file loaded against them.
//!
//! Schemas can be built in code or decoded from TOML:
//!
//! ```toml
//! [[blocks]]
//! name = "controller"
//! mandatory = true
//!
//! [[blocks.params]]
//! name = "port"
//! type = "uint32"
//! min = 1
//! max = 65535
//! mandatory = true
//! ```

pub mod index;

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

pub use index::{BlockIndex, SchemaIndex};

/// Upper bound on the element count of any array parameter.
pub const MAX_ARRAY_ELEMENTS: usize = 1024;

/// Declared type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Byte,
    String,
    Bool,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Long,
    ULong,
}

impl ValueType {
    /// Natural range of a signed integer type.
    pub fn signed_range(self) -> Option<(i64, i64)> {
        match self {
            ValueType::Int32 => Some((i64::from(i32::MIN), i64::from(i32::MAX))),
            ValueType::Int64 | ValueType::Long => Some((i64::MIN, i64::MAX)),
            _ => None,
        }
    }

    /// Natural range of an unsigned integer type.
    pub fn unsigned_range(self) -> Option<(u64, u64)> {
        match self {
            ValueType::Byte => Some((0, u64::from(u8::MAX))),
            ValueType::UInt32 => Some((0, u64::from(u32::MAX))),
            ValueType::UInt64 | ValueType::ULong => Some((0, u64::MAX)),
            _ => None,
        }
    }

    pub fn is_integer(self) -> bool {
        self.signed_range().is_some() || self.unsigned_range().is_some()
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Byte => "byte",
            ValueType::String => "string",
            ValueType::Bool => "bool",
            ValueType::Int32 => "int32",
            ValueType::UInt32 => "uint32",
            ValueType::Int64 => "int64",
            ValueType::UInt64 => "uint64",
            ValueType::Long => "long",
            ValueType::ULong => "ulong",
        };
        f.write_str(name)
    }
}

/// Element count of an array parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many elements.
    Fixed(usize),
    /// Anywhere from zero to [`MAX_ARRAY_ELEMENTS`].
    Variable,
}

/// Scalar or array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Scalar,
    Array(Arity),
}

/// Declared value or length bounds, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bounds {
    None,
    Signed { min: i64, max: i64 },
    Unsigned { min: u64, max: u64 },
    Length { min: usize, max: usize },
}

/// One parameter of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawParamDef", into = "RawParamDef")]
pub struct ParamDef {
    pub name: String,
    pub ty: ValueType,
    pub shape: Shape,
    pub bounds: Bounds,
    pub mandatory: bool,
}

impl ParamDef {
    /// A non-mandatory scalar parameter without bounds.
    pub fn new(name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            name: name.into(),
            ty,
            shape: Shape::Scalar,
            bounds: Bounds::None,
            mandatory: false,
        }
    }

    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    /// Make this an array of exactly `count` elements.
    pub fn array(mut self, count: usize) -> Self {
        self.shape = Shape::Array(Arity::Fixed(count));
        self
    }

    /// Make this an array of any length up to [`MAX_ARRAY_ELEMENTS`].
    pub fn variable_array(mut self) -> Self {
        self.shape = Shape::Array(Arity::Variable);
        self
    }

    pub fn signed_range(mut self, min: i64, max: i64) -> Self {
        self.bounds = Bounds::Signed { min, max };
        self
    }

    pub fn unsigned_range(mut self, min: u64, max: u64) -> Self {
        self.bounds = Bounds::Unsigned { min, max };
        self
    }

    /// Bound the length of a string parameter.
    pub fn length(mut self, min: usize, max: usize) -> Self {
        self.bounds = Bounds::Length { min, max };
        self
    }

    pub fn is_array(&self) -> bool {
        matches!(self.shape, Shape::Array(_))
    }

    /// Declared bounds intersected with the natural range of a signed type.
    pub fn effective_signed(&self) -> Option<(i64, i64)> {
        let (lo, hi) = self.ty.signed_range()?;
        Some(match self.bounds {
            Bounds::Signed { min, max } => (min.max(lo), max.min(hi)),
            _ => (lo, hi),
        })
    }

    /// Declared bounds intersected with the natural range of an unsigned type.
    pub fn effective_unsigned(&self) -> Option<(u64, u64)> {
        let (lo, hi) = self.ty.unsigned_range()?;
        Some(match self.bounds {
            Bounds::Unsigned { min, max } => (min.max(lo), max.min(hi)),
            _ => (lo, hi),
        })
    }

    fn validate(&self, block: &str) -> std::result::Result<(), String> {
        let what = format!("parameter '{}.{}'", block, self.name);
        if self.name.is_empty() {
            return Err(format!("block '{}' has a parameter with an empty name", block));
        }
        if let Shape::Array(Arity::Fixed(n)) = self.shape {
            if n > MAX_ARRAY_ELEMENTS {
                return Err(format!(
                    "{} declares {} elements, more than the maximum {}",
                    what, n, MAX_ARRAY_ELEMENTS
                ));
            }
        }
        match self.bounds {
            Bounds::None => Ok(()),
            Bounds::Signed { min, max } if self.ty.signed_range().is_some() => {
                if min > max {
                    Err(format!("{} has min {} > max {}", what, min, max))
                } else {
                    Ok(())
                }
            }
            Bounds::Unsigned { min, max } if self.ty.unsigned_range().is_some() => {
                if min > max {
                    Err(format!("{} has min {} > max {}", what, min, max))
                } else {
                    Ok(())
                }
            }
            Bounds::Length { min, max } if self.ty == ValueType::String => {
                if min > max {
                    Err(format!("{} has min length {} > max {}", what, min, max))
                } else {
                    Ok(())
                }
            }
            _ => Err(format!("{} has bounds that do not apply to type {}", what, self.ty)),
        }
    }
}

/// A plain block or a keyed map of blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDef {
    pub name: String,
    #[serde(default, rename = "map")]
    pub is_map: bool,
    #[serde(default)]
    pub mandatory: bool,
    #[serde(default)]
    pub params: Vec<ParamDef>,
}

impl BlockDef {
    /// A plain, optional block.
    pub fn block(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_map: false,
            mandatory: false,
            params: Vec::new(),
        }
    }

    /// An optional map of keyed blocks.
    pub fn map(name: impl Into<String>) -> Self {
        Self {
            is_map: true,
            ..Self::block(name)
        }
    }

    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    pub fn param(mut self, param: ParamDef) -> Self {
        self.params.push(param);
        self
    }

    pub fn find_param(&self, name: &str) -> Option<&ParamDef> {
        self.params.iter().find(|p| p.name == name)
    }
}

/// A complete configuration dialect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    blocks: Vec<BlockDef>,
}

impl Schema {
    /// Build and validate a schema.
    pub fn new(blocks: Vec<BlockDef>) -> Result<Self> {
        let schema = Self { blocks };
        schema.validate()?;
        Ok(schema)
    }

    /// Decode and validate a schema from its TOML form.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let schema: Schema = toml::from_str(text)?;
        schema.validate()?;
        Ok(schema)
    }

    pub fn blocks(&self) -> &[BlockDef] {
        &self.blocks
    }

    pub fn find(&self, name: &str) -> Option<&BlockDef> {
        self.blocks.iter().find(|b| b.name == name)
    }

    /// Check the schema for structural problems.
    ///
    /// Block and map names share one namespace; parameter names must be
    /// unique within their block.
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for block in &self.blocks {
            if block.name.is_empty() {
                return Err(ConfigError::InvalidSchema("block with an empty name".into()));
            }
            if !names.insert(block.name.as_str()) {
                return Err(ConfigError::InvalidSchema(format!(
                    "block '{}' is defined more than once",
                    block.name
                )));
            }
            let mut params = HashSet::new();
            for param in &block.params {
                if !params.insert(param.name.as_str()) {
                    return Err(ConfigError::InvalidSchema(format!(
                        "parameter '{}.{}' is defined more than once",
                        block.name, param.name
                    )));
                }
                param.validate(&block.name).map_err(ConfigError::InvalidSchema)?;
            }
        }
        Ok(())
    }
}

/// Flat serde form of [`ParamDef`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawParamDef {
    name: String,
    #[serde(rename = "type")]
    ty: ValueType,
    /// Fixed element count, or the string "variable".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    array: Option<RawArity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max: Option<i64>,
    #[serde(default)]
    mandatory: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawArity {
    Fixed(usize),
    Variable(String),
}

impl TryFrom<RawParamDef> for ParamDef {
    type Error = String;

    fn try_from(raw: RawParamDef) -> std::result::Result<Self, Self::Error> {
        let shape = match raw.array {
            None => Shape::Scalar,
            Some(RawArity::Fixed(n)) => Shape::Array(Arity::Fixed(n)),
            Some(RawArity::Variable(s)) if s == "variable" => Shape::Array(Arity::Variable),
            Some(RawArity::Variable(s)) => {
                return Err(format!("parameter '{}': invalid array arity '{}'", raw.name, s))
            }
        };

        let bounds = match (raw.min, raw.max) {
            (None, None) => Bounds::None,
            (min, max) => match raw.ty {
                ValueType::String => {
                    let min = usize::try_from(min.unwrap_or(0))
                        .map_err(|_| format!("parameter '{}': negative length", raw.name))?;
                    let max = match max {
                        Some(m) => usize::try_from(m)
                            .map_err(|_| format!("parameter '{}': negative length", raw.name))?,
                        None => usize::MAX,
                    };
                    Bounds::Length { min, max }
                }
                ty if ty.signed_range().is_some() => Bounds::Signed {
                    min: min.unwrap_or(i64::MIN),
                    max: max.unwrap_or(i64::MAX),
                },
                ty if ty.unsigned_range().is_some() => {
                    let min = u64::try_from(min.unwrap_or(0))
                        .map_err(|_| format!("parameter '{}': negative bound", raw.name))?;
                    let max = match max {
                        Some(m) => u64::try_from(m)
                            .map_err(|_| format!("parameter '{}': negative bound", raw.name))?,
                        None => u64::MAX,
                    };
                    Bounds::Unsigned { min, max }
                }
                ty => return Err(format!("parameter '{}': type {} takes no bounds", raw.name, ty)),
            },
        };

        Ok(ParamDef {
            name: raw.name,
            ty: raw.ty,
            shape,
            bounds,
            mandatory: raw.mandatory,
        })
    }
}

impl From<ParamDef> for RawParamDef {
    fn from(def: ParamDef) -> Self {
        let array = match def.shape {
            Shape::Scalar => None,
            Shape::Array(Arity::Fixed(n)) => Some(RawArity::Fixed(n)),
            Shape::Array(Arity::Variable) => Some(RawArity::Variable("variable".into())),
        };
        let (min, max) = match def.bounds {
            Bounds::None => (None, None),
            Bounds::Signed { min, max } => (Some(min), Some(max)),
            Bounds::Unsigned { min, max } => {
                (i64::try_from(min).ok(), i64::try_from(max).ok())
            }
            Bounds::Length { min, max } => (i64::try_from(min).ok(), i64::try_from(max).ok()),
        };
        RawParamDef {
            name: def.name,
            ty: def.ty,
            array,
            min,
            max,
            mandatory: def.mandatory,
        }
    }
}
