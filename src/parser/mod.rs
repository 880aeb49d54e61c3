//! Schema-driven recursive-descent parser.
//!
//! # Data Flow
//! ```text
//! Lexer tokens
//!     → mod.rs (top level: block / map keyword, map key)
//!     → block.rs (name = value; state machine, duplicate and mandatory checks)
//!     → value.rs (typed scalars and arrays, range and arity checks)
//!     → FileTables
//! ```
//!
//! # Design Decisions
//! - The first violation aborts the whole parse; no partial tables escape
//! - The block/map-level mandatory check can be skipped so that merge
//!   participants are only checked after combining

mod block;
mod value;

use std::path::Path;

use crate::config::validation::check_mandatory;
use crate::error::{ConfigError, Location, Result};
use crate::lexer::{LexErrorKind, Lexer, Token};
use crate::schema::{Schema, SchemaIndex};
use crate::tables::{BlockInstance, FileTables};

/// Parse configuration text held in memory.
///
/// Every mandatory block and map must be present.
pub fn parse_str(schema: &Schema, text: &str) -> Result<FileTables> {
    Parser::new(schema, text.as_bytes(), None).parse(true)
}

/// Parser state for one source text.
pub struct Parser<'a, 's> {
    lexer: Lexer<'a>,
    index: SchemaIndex<'s>,
    schema: &'s Schema,
    path: Option<&'a Path>,
}

impl<'a, 's> Parser<'a, 's> {
    /// `path` is only used to label errors.
    pub fn new(schema: &'s Schema, input: &'a [u8], path: Option<&'a Path>) -> Self {
        Self {
            lexer: Lexer::new(input),
            index: SchemaIndex::new(schema),
            schema,
            path,
        }
    }

    /// Parse the whole input.
    ///
    /// With `check_mandatory` unset, missing mandatory blocks and maps are
    /// not reported (mandatory parameters inside a present block still are).
    pub fn parse(mut self, check_mandatory_blocks: bool) -> Result<FileTables> {
        let mut tables = FileTables::new();

        while let Some(token) = self.next_token(false)? {
            let keyword = match token {
                Token::Symbol(name) => name,
                other => {
                    return Err(self.error(format!(
                        "expected block name, got {}",
                        other.describe()
                    )))
                }
            };
            let Some(block) = self.index.lookup(&keyword) else {
                return Err(self.error(format!("unknown block '{}'", keyword)));
            };
            let def = block.def;

            if def.is_map {
                let key = match self.next_required()? {
                    Token::String(key) | Token::Symbol(key) => key,
                    other => {
                        return Err(self.error(format!(
                            "expected key for map '{}', got {}",
                            def.name,
                            other.describe()
                        )))
                    }
                };
                if tables.map(&def.name).is_some_and(|m| m.contains(&key)) {
                    return Err(self.error(format!(
                        "map '{}' key '{}' already defined",
                        def.name, key
                    )));
                }
                self.expect(Token::LeftBrace)?;
                let mut instance = BlockInstance::new(key.as_ref());
                self.parse_block_body(def, &mut instance)?;
                if let Err(rejected) = tables.map_entry_mut(&def.name).insert(instance) {
                    return Err(self.error(format!(
                        "map '{}' key '{}' already defined",
                        def.name, rejected.name
                    )));
                }
            } else {
                if tables.contains_block(&def.name) {
                    return Err(self.error(format!("block '{}' already defined", def.name)));
                }
                self.expect(Token::LeftBrace)?;
                let mut instance = BlockInstance::new(def.name.as_str());
                self.parse_block_body(def, &mut instance)?;
                if let Err(rejected) = tables.insert_block(instance) {
                    return Err(self.error(format!("block '{}' already defined", rejected.name)));
                }
            }
        }

        if check_mandatory_blocks {
            check_mandatory(self.schema, &tables, Location::file(self.path))?;
        }
        Ok(tables)
    }

    fn location(&self) -> Location {
        Location::line(self.path, self.lexer.line())
    }

    fn error(&self, message: impl Into<String>) -> ConfigError {
        ConfigError::schema(self.location(), message)
    }

    fn next_token(&mut self, required: bool) -> Result<Option<Token>> {
        self.lexer
            .next_token(required)
            .map_err(|e| ConfigError::lex(Location::line(self.path, e.line), e.kind))
    }

    /// Next token where end of file is an error.
    fn next_required(&mut self) -> Result<Token> {
        match self.next_token(true)? {
            Some(token) => Ok(token),
            None => Err(ConfigError::lex(self.location(), LexErrorKind::UnexpectedEof)),
        }
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        let token = self.next_required()?;
        if token == expected {
            Ok(())
        } else {
            Err(self.error(format!(
                "expected '{}', got {}",
                expected,
                token.describe()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{BlockDef, ParamDef, ValueType};
    use crate::tables::Scalar;

    fn schema() -> Schema {
        Schema::new(vec![
            BlockDef::block("system")
                .mandatory()
                .param(ParamDef::new("name", ValueType::String).mandatory())
                .param(ParamDef::new("debug", ValueType::Bool)),
            BlockDef::map("bridge").param(ParamDef::new("mtu", ValueType::UInt32)),
            BlockDef::block("extra"),
        ])
        .unwrap()
    }

    #[test]
    fn test_blocks_and_maps() {
        let tables = parse_str(
            &schema(),
            r#"
            system { name = "ctl"; debug = TRUE; }
            bridge "br0" { mtu = 1500; }
            bridge br1 { }
            extra { }
            "#,
        )
        .unwrap();

        let system = tables.block("system").unwrap();
        assert_eq!(
            system.param("debug").unwrap().as_scalar(),
            Some(&Scalar::Bool(true))
        );
        let bridges = tables.map("bridge").unwrap();
        assert_eq!(bridges.keys(), ["br0", "br1"]);
        assert!(bridges.get("br1").unwrap().is_empty());
        assert!(tables.block("extra").is_some());
    }

    #[test]
    fn test_duplicate_block() {
        let err = parse_str(
            &schema(),
            "system { name = \"a\"; }\nsystem { name = \"b\"; }",
        )
        .unwrap_err();
        match err {
            ConfigError::Schema { location, message } => {
                assert_eq!(location.line, Some(2));
                assert!(message.contains("already defined"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_map_key() {
        let err = parse_str(
            &schema(),
            "system { name = \"a\"; } bridge x { } bridge \"x\" { }",
        )
        .unwrap_err();
        assert!(err.to_string().contains("key 'x' already defined"));
    }

    #[test]
    fn test_unknown_block_and_bad_keyword() {
        let err = parse_str(&schema(), "nosuch { }").unwrap_err();
        assert!(err.to_string().contains("unknown block 'nosuch'"));

        let err = parse_str(&schema(), "\"system\" { }").unwrap_err();
        assert!(err.to_string().contains("expected block name"));
    }

    #[test]
    fn test_map_requires_key() {
        let err = parse_str(&schema(), "bridge { }").unwrap_err();
        assert!(err.to_string().contains("expected key for map 'bridge'"));
    }

    #[test]
    fn test_missing_mandatory_block() {
        let err = parse_str(&schema(), "extra { }").unwrap_err();
        assert!(matches!(err, ConfigError::MandatoryMissing { .. }));

        let tables = Parser::new(&schema(), b"extra { }", None).parse(false).unwrap();
        assert!(tables.block("system").is_none());
    }

    #[test]
    fn test_eof_inside_block() {
        let err = parse_str(&schema(), "system { name = ").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Lex {
                kind: crate::lexer::LexErrorKind::UnexpectedEof,
                ..
            }
        ));
    }

    #[test]
    fn test_errors_carry_path() {
        let path = Path::new("/etc/ctl/primary.conf");
        let err = Parser::new(&schema(), b"\n\nbogus { }", Some(path))
            .parse(true)
            .unwrap_err();
        assert!(err.to_string().starts_with("/etc/ctl/primary.conf:3:"));
    }
}
