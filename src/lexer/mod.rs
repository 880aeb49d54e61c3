//! Tokenizer for the block configuration language.
//!
//! # Data Flow
//! ```text
//! file bytes
//!     → lookahead.rs (pushback stack, line counting)
//!     → scanner.rs (whitespace/comments, literals, symbols)
//!     → Token stream consumed by the parser
//! ```
//!
//! # Design Decisions
//! - The whole file is in memory before lexing starts; no streaming
//! - Integers carry an unsigned magnitude plus a sign flag so that the
//!   most negative 64-bit value needs no special casing
//! - Adjacent quoted strings are joined into one token

pub mod lookahead;
pub mod scanner;
pub mod token;

use thiserror::Error;

pub use lookahead::{Lookahead, PUSHBACK_DEPTH};
pub use scanner::{Lexer, MAX_SYMBOL_LEN};
pub use token::Token;

/// Malformed-token conditions reported by the lexer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexErrorKind {
    #[error("unexpected end of file")]
    UnexpectedEof,

    #[error("unterminated string")]
    UnterminatedString,

    #[error("unsupported escape sequence '\\{0}'")]
    BadEscape(char),

    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),

    #[error("symbol longer than {MAX_SYMBOL_LEN} characters")]
    SymbolTooLong,

    #[error("hex literal requires at least one hex digit")]
    MissingHexDigits,

    #[error("'-' must be followed by a decimal digit, got {0}")]
    MissingDigits(String),

    #[error("invalid digit '{digit}' in base {base} literal")]
    InvalidDigit { digit: char, base: u32 },

    #[error("integer literal overflows 64 bits")]
    Overflow,

    #[error("string is not valid UTF-8")]
    InvalidUtf8,

    #[error("file too large: line counter overflow")]
    FileTooLarge,

    #[error("lookahead stack exhausted")]
    PushbackOverflow,
}

/// A lexer failure together with the line it occurred on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct LexError {
    pub line: u32,
    pub kind: LexErrorKind,
}
