//! Typed value parsing with range, length and arity checks.

use super::Parser;
use crate::error::Result;
use crate::lexer::Token;
use crate::schema::{Arity, Bounds, ParamDef, Shape, ValueType, MAX_ARRAY_ELEMENTS};
use crate::tables::{ArrayValue, ParamValue, Scalar};

impl<'a, 's> Parser<'a, 's> {
    /// Parse the right-hand side of `name = value;` for `param`.
    pub(super) fn parse_value(&mut self, param: &ParamDef) -> Result<ParamValue> {
        match param.shape {
            Shape::Scalar => {
                let token = self.next_required()?;
                Ok(ParamValue::scalar(self.scalar(param, token)?))
            }
            Shape::Array(arity) => self.parse_array(param, arity),
        }
    }

    fn parse_array(&mut self, param: &ParamDef, arity: Arity) -> Result<ParamValue> {
        self.expect(Token::LeftBracket)?;

        let mut items = Vec::new();
        loop {
            let token = self.next_required()?;
            if token == Token::RightBracket {
                break;
            }
            if items.len() == MAX_ARRAY_ELEMENTS {
                return Err(self.error(format!(
                    "parameter '{}' accepts at most {} elements",
                    param.name, MAX_ARRAY_ELEMENTS
                )));
            }
            items.push(self.scalar(param, token)?);

            match self.next_required()? {
                Token::Comma => continue,
                Token::RightBracket => break,
                other => {
                    return Err(self.error(format!(
                        "expected ',' or ']' in array '{}', got {}",
                        param.name,
                        other.describe()
                    )))
                }
            }
        }

        if let Arity::Fixed(required) = arity {
            if items.len() != required {
                return Err(self.error(format!(
                    "parameter '{}' requires {} elements, got {}",
                    param.name,
                    required,
                    items.len()
                )));
            }
        }

        let array = ArrayValue::from_scalars(param.ty, items)?.ok_or_else(|| {
            self.error(format!("parameter '{}' has mixed element types", param.name))
        })?;
        Ok(ParamValue::array(param.ty, array))
    }

    /// Convert one token into a value of the parameter's declared type.
    fn scalar(&self, param: &ParamDef, token: Token) -> Result<Scalar> {
        match param.ty {
            ValueType::String => self.string_value(param, token).map(Scalar::String),
            ValueType::Bool => self.bool_value(param, token).map(Scalar::Bool),
            ValueType::Byte => {
                let v = self.verify_unsigned(param, &token)?;
                self.narrow(param, &token, u8::try_from(v)).map(Scalar::Byte)
            }
            ValueType::UInt32 => {
                let v = self.verify_unsigned(param, &token)?;
                self.narrow(param, &token, u32::try_from(v)).map(Scalar::UInt32)
            }
            ValueType::UInt64 => self.verify_unsigned(param, &token).map(Scalar::UInt64),
            ValueType::ULong => self.verify_unsigned(param, &token).map(Scalar::ULong),
            ValueType::Int32 => {
                let v = self.verify_signed(param, &token)?;
                self.narrow(param, &token, i32::try_from(v)).map(Scalar::Int32)
            }
            ValueType::Int64 => self.verify_signed(param, &token).map(Scalar::Int64),
            ValueType::Long => self.verify_signed(param, &token).map(Scalar::Long),
        }
    }

    fn narrow<T, E>(
        &self,
        param: &ParamDef,
        token: &Token,
        result: std::result::Result<T, E>,
    ) -> Result<T> {
        result.map_err(|_| {
            self.error(format!(
                "value {} of parameter '{}' does not fit type {}",
                token, param.name, param.ty
            ))
        })
    }

    fn string_value(&self, param: &ParamDef, token: Token) -> Result<String> {
        let Token::String(text) = token else {
            return Err(self.error(format!(
                "parameter '{}' expects a string, got {}",
                param.name,
                token.describe()
            )));
        };
        if let Bounds::Length { min, max } = param.bounds {
            let len = text.len();
            if len < min || len > max {
                return Err(self.error(format!(
                    "string length {} of parameter '{}' is outside [{}, {}]",
                    len, param.name, min, max
                )));
            }
        }
        Ok(text.to_string())
    }

    fn bool_value(&self, param: &ParamDef, token: Token) -> Result<bool> {
        if let Token::Symbol(word) = &token {
            if word.eq_ignore_ascii_case("true") {
                return Ok(true);
            }
            if word.eq_ignore_ascii_case("false") {
                return Ok(false);
            }
        }
        Err(self.error(format!(
            "parameter '{}' expects true or false, got {}",
            param.name,
            token.describe()
        )))
    }

    /// Check an integer token against a signed parameter's bounds.
    fn verify_signed(&self, param: &ParamDef, token: &Token) -> Result<i64> {
        let (magnitude, negative) = self.integer_parts(param, token)?;
        let (min, max) = param
            .effective_signed()
            .unwrap_or((i64::MIN, i64::MAX));

        let value = if negative {
            -i128::from(magnitude)
        } else {
            i128::from(magnitude)
        };
        if value < i128::from(min) || value > i128::from(max) {
            return Err(self.error(format!(
                "value {} of parameter '{}' is out of range [{}, {}]",
                token, param.name, min, max
            )));
        }
        self.narrow(param, token, i64::try_from(value))
    }

    /// Check an integer token against an unsigned parameter's bounds.
    fn verify_unsigned(&self, param: &ParamDef, token: &Token) -> Result<u64> {
        let (magnitude, negative) = self.integer_parts(param, token)?;
        if negative && magnitude != 0 {
            return Err(self.error(format!(
                "parameter '{}' is unsigned, got negative value {}",
                param.name, token
            )));
        }
        let (min, max) = param.effective_unsigned().unwrap_or((0, u64::MAX));
        if magnitude < min || magnitude > max {
            return Err(self.error(format!(
                "value {} of parameter '{}' is out of range [{}, {}]",
                token, param.name, min, max
            )));
        }
        Ok(magnitude)
    }

    fn integer_parts(&self, param: &ParamDef, token: &Token) -> Result<(u64, bool)> {
        match token {
            Token::Integer { magnitude, negative } => Ok((*magnitude, *negative)),
            other => Err(self.error(format!(
                "parameter '{}' expects an integer, got {}",
                param.name,
                other.describe()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ConfigError;
    use crate::parser::parse_str;
    use crate::schema::{BlockDef, ParamDef, Schema, ValueType};
    use crate::tables::{ArrayValue, FileTables, Scalar};

    fn schema() -> Schema {
        Schema::new(vec![BlockDef::block("b")
            .param(ParamDef::new("byte", ValueType::Byte).unsigned_range(0, 0x0F))
            .param(ParamDef::new("u32", ValueType::UInt32))
            .param(ParamDef::new("i32", ValueType::Int32).signed_range(-10, 10))
            .param(ParamDef::new("i64", ValueType::Int64))
            .param(ParamDef::new("long", ValueType::Long))
            .param(ParamDef::new("ulong", ValueType::ULong))
            .param(ParamDef::new("u64", ValueType::UInt64))
            .param(ParamDef::new("name", ValueType::String).length(1, 5))
            .param(ParamDef::new("flag", ValueType::Bool))
            .param(ParamDef::new("mac", ValueType::Byte).array(3))
            .param(ParamDef::new("peers", ValueType::String).variable_array())])
        .unwrap()
    }

    fn parse(body: &str) -> crate::error::Result<FileTables> {
        parse_str(&schema(), &format!("b {{ {} }}", body))
    }

    fn scalar(tables: &FileTables, name: &str) -> Scalar {
        tables
            .block("b")
            .unwrap()
            .param(name)
            .unwrap()
            .as_scalar()
            .unwrap()
            .clone()
    }

    #[test]
    fn test_scalar_types() {
        let t = parse(
            "byte = 0x0F; u32 = 4294967295; i32 = -10; i64 = -9223372036854775808; \
             long = 017; ulong = 18446744073709551615; u64 = 0; name = \"ab\"\"c\"; flag = False;",
        )
        .unwrap();
        assert_eq!(scalar(&t, "byte"), Scalar::Byte(15));
        assert_eq!(scalar(&t, "u32"), Scalar::UInt32(u32::MAX));
        assert_eq!(scalar(&t, "i32"), Scalar::Int32(-10));
        assert_eq!(scalar(&t, "i64"), Scalar::Int64(i64::MIN));
        assert_eq!(scalar(&t, "long"), Scalar::Long(15));
        assert_eq!(scalar(&t, "ulong"), Scalar::ULong(u64::MAX));
        assert_eq!(scalar(&t, "u64"), Scalar::UInt64(0));
        assert_eq!(scalar(&t, "name"), Scalar::String("abc".into()));
        assert_eq!(scalar(&t, "flag"), Scalar::Bool(false));
    }

    #[test]
    fn test_range_violations() {
        let err = parse("byte = 0xFF;").unwrap_err();
        assert!(err.to_string().contains("value 255 of parameter 'byte' is out of range [0, 15]"));

        let err = parse("u32 = -1;").unwrap_err();
        assert!(err.to_string().contains("unsigned"));

        let err = parse("u32 = 4294967296;").unwrap_err();
        assert!(matches!(err, ConfigError::Schema { .. }));

        let err = parse("i32 = 11;").unwrap_err();
        assert!(err.to_string().contains("[-10, 10]"));

        let err = parse("i64 = -9223372036854775809;").unwrap_err();
        assert!(matches!(err, ConfigError::Schema { .. }));
    }

    #[test]
    fn test_negative_zero_is_unsigned_zero() {
        let t = parse("u32 = -0; u64 = -0x0;").unwrap();
        assert_eq!(scalar(&t, "u32"), Scalar::UInt32(0));
        assert_eq!(scalar(&t, "u64"), Scalar::UInt64(0));
        assert!(parse("u64 = -1;").is_err());
    }

    #[test]
    fn test_spaced_strings_stay_separate() {
        let err = parse("name = \"ab\" \"c\";").unwrap_err();
        assert!(err.to_string().contains("expected ';'"), "{err}");
    }

    #[test]
    fn test_decimal_overflow_is_distinct() {
        let err = parse("u64 = 18446744073709551616;").unwrap_err();
        assert!(matches!(err, ConfigError::Overflow { .. }));
    }

    #[test]
    fn test_string_length_and_type() {
        assert!(parse("name = \"\";").unwrap_err().to_string().contains("outside [1, 5]"));
        assert!(parse("name = \"toolong\";").is_err());
        assert!(parse("name = 5;").unwrap_err().to_string().contains("expects a string"));
    }

    #[test]
    fn test_bool_literals() {
        assert!(parse("flag = yes;").unwrap_err().to_string().contains("true or false"));
        assert!(parse("flag = \"true\";").is_err());
        assert!(parse("flag = 1;").is_err());
    }

    #[test]
    fn test_fixed_arity() {
        let t = parse("mac = [1, 2, 3,];").unwrap();
        let mac = t.block("b").unwrap().param("mac").unwrap();
        assert_eq!(mac.as_array(), Some(&ArrayValue::Byte(vec![1, 2, 3])));
        assert_eq!(mac.count(), 3);

        let err = parse("mac = [1, 2];").unwrap_err();
        assert!(err.to_string().contains("requires 3 elements, got 2"));
        let err = parse("mac = [1, 2, 3, 4];").unwrap_err();
        assert!(err.to_string().contains("requires 3 elements, got 4"));
    }

    #[test]
    fn test_variable_arity() {
        let t = parse("peers = [];").unwrap();
        assert_eq!(t.block("b").unwrap().param("peers").unwrap().count(), 0);

        let t = parse("peers = [\"a\", \"b\"];").unwrap();
        assert_eq!(
            t.block("b").unwrap().param("peers").unwrap().as_array(),
            Some(&ArrayValue::String(vec!["a".into(), "b".into()]))
        );

        let many = vec!["\"x\""; crate::schema::MAX_ARRAY_ELEMENTS + 1].join(",");
        let err = parse(&format!("peers = [{}];", many)).unwrap_err();
        assert!(err.to_string().contains("at most"));
    }

    #[test]
    fn test_array_syntax_errors() {
        assert!(parse("mac = 1;").unwrap_err().to_string().contains("expected '['"));
        assert!(parse("mac = [1 2 3];").unwrap_err().to_string().contains("expected ',' or ']'"));
        assert!(parse("mac = [,];").is_err());
    }
}
