//! Token scanner.
//!
//! # Responsibilities
//! - Skip whitespace and `#` comments between tokens
//! - Recognize punctuation, symbols, quoted strings and integers
//! - Decode backslash escapes and join adjacent string literals
//! - Detect integer overflow separately from other malformed input

use std::rc::Rc;

use super::lookahead::Lookahead;
use super::token::Token;
use super::{LexError, LexErrorKind};

/// Longest accepted symbol, in bytes.
pub const MAX_SYMBOL_LEN: usize = 128;

/// Turns configuration text into [`Token`]s.
#[derive(Debug)]
pub struct Lexer<'a> {
    input: Lookahead<'a>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input: Lookahead::new(input),
        }
    }

    /// Line of the most recently consumed character.
    pub fn line(&self) -> u32 {
        self.input.line()
    }

    /// Read the next token.
    ///
    /// Returns `Ok(None)` only on a clean end of file. When `required` is
    /// set, end of file is reported as [`LexErrorKind::UnexpectedEof`].
    pub fn next_token(&mut self, required: bool) -> Result<Option<Token>, LexError> {
        self.scan(required).map_err(|kind| LexError {
            line: self.input.line(),
            kind,
        })
    }

    fn scan(&mut self, required: bool) -> Result<Option<Token>, LexErrorKind> {
        let first = match self.skip_blank()? {
            Some(b) => b,
            None if required => return Err(LexErrorKind::UnexpectedEof),
            None => return Ok(None),
        };

        if let Some(token) = Token::punctuation(first) {
            return Ok(Some(token));
        }

        match first {
            b'"' => self.string().map(Some),
            b'-' | b'0'..=b'9' => self.integer(first).map(Some),
            b if b.is_ascii_alphabetic() || b == b'_' => self.symbol(first).map(Some),
            other => Err(LexErrorKind::UnexpectedChar(char::from(other))),
        }
    }

    /// Consume whitespace and comments; return the first significant byte.
    fn skip_blank(&mut self) -> Result<Option<u8>, LexErrorKind> {
        let mut in_comment = false;
        while let Some(b) = self.input.next()? {
            match b {
                b'\n' => in_comment = false,
                _ if in_comment => {}
                b'#' => in_comment = true,
                b if b.is_ascii_whitespace() => {}
                b => return Ok(Some(b)),
            }
        }
        Ok(None)
    }

    fn symbol(&mut self, first: u8) -> Result<Token, LexErrorKind> {
        let mut text = String::new();
        text.push(char::from(first));
        while let Some(b) = self.input.next()? {
            if b.is_ascii_alphanumeric() || b == b'_' {
                if text.len() == MAX_SYMBOL_LEN {
                    return Err(LexErrorKind::SymbolTooLong);
                }
                text.push(char::from(b));
            } else {
                self.input.push_back(b)?;
                break;
            }
        }
        Ok(Token::Symbol(Rc::from(text)))
    }

    /// Read a quoted string whose opening quote was already consumed, plus
    /// any string literals that follow it immediately.
    fn string(&mut self) -> Result<Token, LexErrorKind> {
        let mut bytes = Vec::new();
        loop {
            self.string_body(&mut bytes)?;
            match self.input.next()? {
                Some(b'"') => continue,
                Some(b) => {
                    self.input.push_back(b)?;
                    break;
                }
                None => break,
            }
        }
        let text = String::from_utf8(bytes).map_err(|_| LexErrorKind::InvalidUtf8)?;
        Ok(Token::String(Rc::from(text)))
    }

    fn string_body(&mut self, out: &mut Vec<u8>) -> Result<(), LexErrorKind> {
        loop {
            match self.input.next()? {
                None => return Err(LexErrorKind::UnterminatedString),
                Some(b'"') => return Ok(()),
                Some(b'\\') => {
                    let escaped = match self.input.next()? {
                        None => return Err(LexErrorKind::UnterminatedString),
                        Some(b'n') => b'\n',
                        Some(b'r') => b'\r',
                        Some(b't') => b'\t',
                        Some(b'\'') => b'\'',
                        Some(b'"') => b'"',
                        Some(b'\\') => b'\\',
                        Some(other) => return Err(LexErrorKind::BadEscape(char::from(other))),
                    };
                    out.push(escaped);
                }
                Some(b) => out.push(b),
            }
        }
    }

    fn integer(&mut self, first: u8) -> Result<Token, LexErrorKind> {
        let negative = first == b'-';
        let lead = if negative {
            match self.input.next()? {
                Some(b) if b.is_ascii_digit() => b,
                Some(b) => {
                    self.input.push_back(b)?;
                    return Err(LexErrorKind::MissingDigits(format!("'{}'", char::from(b))));
                }
                None => return Err(LexErrorKind::MissingDigits("end of file".into())),
            }
        } else {
            first
        };

        let (base, mut magnitude) = if lead == b'0' {
            match self.input.next()? {
                Some(b'x') | Some(b'X') => {
                    match self.input.peek()? {
                        Some(b) if b.is_ascii_hexdigit() => {}
                        _ => return Err(LexErrorKind::MissingHexDigits),
                    }
                    (16, 0)
                }
                Some(b) => {
                    self.input.push_back(b)?;
                    (8, 0)
                }
                None => (8, 0),
            }
        } else {
            (10, u64::from(lead - b'0'))
        };

        while let Some(b) = self.input.next()? {
            if !(b.is_ascii_alphanumeric() || b == b'_') {
                self.input.push_back(b)?;
                break;
            }
            let digit = char::from(b)
                .to_digit(base)
                .ok_or(LexErrorKind::InvalidDigit {
                    digit: char::from(b),
                    base,
                })?;
            magnitude = magnitude
                .checked_mul(u64::from(base))
                .and_then(|m| m.checked_add(u64::from(digit)))
                .ok_or(LexErrorKind::Overflow)?;
        }

        Ok(Token::Integer { magnitude, negative })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(text: &str) -> Result<Vec<Token>, LexError> {
        let mut lexer = Lexer::new(text.as_bytes());
        let mut tokens = Vec::new();
        while let Some(token) = lexer.next_token(false)? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn int(magnitude: u64, negative: bool) -> Token {
        Token::Integer { magnitude, negative }
    }

    #[test]
    fn test_block_tokens() {
        let tokens = lex_all("system { port = 8080; }").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Symbol("system".into()),
                Token::LeftBrace,
                Token::Symbol("port".into()),
                Token::Equals,
                int(8080, false),
                Token::Semicolon,
                Token::RightBrace,
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        let tokens = lex_all("# header\na = 1; # trailing { }\n# last").unwrap();
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[2], int(1, false));
    }

    #[test]
    fn test_integer_bases() {
        let tokens = lex_all("0x1F 0X10 017 0 -42 00").unwrap();
        assert_eq!(
            tokens,
            vec![
                int(31, false),
                int(16, false),
                int(15, false),
                int(0, false),
                int(42, true),
                int(0, false),
            ]
        );
    }

    #[test]
    fn test_min_signed_magnitude() {
        let tokens = lex_all("-9223372036854775808").unwrap();
        assert_eq!(tokens, vec![int(1 << 63, true)]);
    }

    #[test]
    fn test_max_unsigned_and_overflow() {
        let tokens = lex_all("18446744073709551615 0xFFFFFFFFFFFFFFFF").unwrap();
        assert_eq!(tokens, vec![int(u64::MAX, false), int(u64::MAX, false)]);

        let err = lex_all("18446744073709551616").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::Overflow);
        let err = lex_all("0x10000000000000000").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::Overflow);
    }

    #[test]
    fn test_bad_integers() {
        assert_eq!(lex_all("0x;").unwrap_err().kind, LexErrorKind::MissingHexDigits);
        assert_eq!(
            lex_all("08").unwrap_err().kind,
            LexErrorKind::InvalidDigit { digit: '8', base: 8 }
        );
        assert_eq!(
            lex_all("12ab").unwrap_err().kind,
            LexErrorKind::InvalidDigit { digit: 'a', base: 10 }
        );
        assert!(matches!(
            lex_all("- 1").unwrap_err().kind,
            LexErrorKind::MissingDigits(_)
        ));
    }

    #[test]
    fn test_string_escapes_and_concatenation() {
        let tokens = lex_all(r#""a\tb\n" "x\"y\\" "one""two""#).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::String("a\tb\n".into()),
                Token::String("x\"y\\".into()),
                Token::String("onetwo".into()),
            ]
        );
    }

    #[test]
    fn test_bad_strings() {
        assert_eq!(
            lex_all(r#""abc"#).unwrap_err().kind,
            LexErrorKind::UnterminatedString
        );
        assert_eq!(
            lex_all(r#""a\qb""#).unwrap_err().kind,
            LexErrorKind::BadEscape('q')
        );
    }

    #[test]
    fn test_symbol_length_limit() {
        let ok = "s".repeat(MAX_SYMBOL_LEN);
        assert_eq!(lex_all(&ok).unwrap(), vec![Token::Symbol(ok.as_str().into())]);

        let long = "s".repeat(MAX_SYMBOL_LEN + 1);
        assert_eq!(lex_all(&long).unwrap_err().kind, LexErrorKind::SymbolTooLong);
    }

    #[test]
    fn test_required_eof() {
        let mut lexer = Lexer::new(b"  # only a comment");
        assert_eq!(lexer.next_token(true).unwrap_err().kind, LexErrorKind::UnexpectedEof);

        let mut lexer = Lexer::new(b"");
        assert_eq!(lexer.next_token(false).unwrap(), None);
    }

    #[test]
    fn test_error_line_numbers() {
        let err = lex_all("a = 1;\nb = 2;\nc = @;").unwrap_err();
        assert_eq!(err.line, 3);
        assert_eq!(err.kind, LexErrorKind::UnexpectedChar('@'));
    }

    #[test]
    fn test_multiline_string_counts_lines() {
        let mut lexer = Lexer::new(b"\"a\nb\" x");
        lexer.next_token(true).unwrap();
        assert_eq!(lexer.line(), 2);
    }
}
