//! Block body parsing.

use std::collections::BTreeSet;

use super::Parser;
use crate::error::{ConfigError, Result};
use crate::lexer::Token;
use crate::schema::{BlockDef, ParamDef};
use crate::tables::BlockInstance;

/// Position inside `name = value;`.
enum State<'s> {
    Name,
    NameRead(&'s ParamDef),
    Value(&'s ParamDef),
    ValueRead,
}

impl<'a, 's> Parser<'a, 's> {
    /// Parse parameters up to and including the closing brace.
    pub(super) fn parse_block_body(
        &mut self,
        def: &'s BlockDef,
        instance: &mut BlockInstance,
    ) -> Result<()> {
        let mut unassigned: BTreeSet<&'s str> = def
            .params
            .iter()
            .filter(|p| p.mandatory)
            .map(|p| p.name.as_str())
            .collect();
        let mut state = State::Name;

        loop {
            state = match state {
                State::Name => match self.next_required()? {
                    Token::RightBrace => break,
                    Token::Symbol(name) => {
                        let param = self
                            .index
                            .lookup(&def.name)
                            .and_then(|block| block.param(&name));
                        let Some(param) = param else {
                            return Err(self.error(format!(
                                "unknown parameter '{}' in block '{}'",
                                name, def.name
                            )));
                        };
                        if instance.contains(&param.name) {
                            return Err(self.error(format!(
                                "parameter '{}' already defined in block '{}'",
                                param.name, instance.name
                            )));
                        }
                        State::NameRead(param)
                    }
                    other => {
                        return Err(self.error(format!(
                            "expected parameter name or '}}', got {}",
                            other.describe()
                        )))
                    }
                },
                State::NameRead(param) => {
                    self.expect(Token::Equals)?;
                    State::Value(param)
                }
                State::Value(param) => {
                    let value = self.parse_value(param)?;
                    if instance.insert_param(param.name.as_str(), value).is_err() {
                        return Err(self.error(format!(
                            "parameter '{}' already defined in block '{}'",
                            param.name, instance.name
                        )));
                    }
                    unassigned.remove(param.name.as_str());
                    State::ValueRead
                }
                State::ValueRead => {
                    self.expect(Token::Semicolon)?;
                    State::Name
                }
            };
        }

        if let Some(missing) = unassigned.first() {
            return Err(ConfigError::MandatoryMissing {
                location: self.location(),
                what: format!("parameter '{}' of block '{}'", missing, instance.name),
            });
        }
        Ok(())
    }
}
