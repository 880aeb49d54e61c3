//! Token definitions.

use std::fmt;
use std::rc::Rc;

/// A lexical token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Semicolon,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Equals,
    Comma,
    /// Identifier: letter or underscore, then letters, digits, underscores.
    Symbol(Rc<str>),
    /// Integer literal as magnitude plus sign.
    Integer { magnitude: u64, negative: bool },
    /// Quoted string with escapes decoded.
    String(Rc<str>),
}

impl Token {
    /// Map a single punctuation byte to its token.
    pub fn punctuation(byte: u8) -> Option<Token> {
        match byte {
            b';' => Some(Token::Semicolon),
            b'{' => Some(Token::LeftBrace),
            b'}' => Some(Token::RightBrace),
            b'[' => Some(Token::LeftBracket),
            b']' => Some(Token::RightBracket),
            b'=' => Some(Token::Equals),
            b',' => Some(Token::Comma),
            _ => None,
        }
    }

    /// Short description used in "expected X, got Y" messages.
    pub fn describe(&self) -> String {
        match self {
            Token::Symbol(s) => format!("symbol '{}'", s),
            Token::String(s) => format!("string \"{}\"", s),
            Token::Integer { .. } => format!("integer {}", self),
            other => format!("'{}'", other),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Semicolon => f.write_str(";"),
            Token::LeftBrace => f.write_str("{"),
            Token::RightBrace => f.write_str("}"),
            Token::LeftBracket => f.write_str("["),
            Token::RightBracket => f.write_str("]"),
            Token::Equals => f.write_str("="),
            Token::Comma => f.write_str(","),
            Token::Symbol(s) => f.write_str(s),
            Token::Integer { magnitude, negative } => {
                if *negative {
                    write!(f, "-{}", magnitude)
                } else {
                    write!(f, "{}", magnitude)
                }
            }
            Token::String(s) => write!(f, "\"{}\"", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_punctuation_table() {
        assert_eq!(Token::punctuation(b'{'), Some(Token::LeftBrace));
        assert_eq!(Token::punctuation(b','), Some(Token::Comma));
        assert_eq!(Token::punctuation(b'a'), None);
    }

    #[test]
    fn test_negative_display() {
        let token = Token::Integer {
            magnitude: 1 << 63,
            negative: true,
        };
        assert_eq!(token.to_string(), "-9223372036854775808");
    }
}
