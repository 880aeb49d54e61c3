//! Character pushback buffer with line counting.

use super::LexErrorKind;

/// Maximum number of characters that can be pushed back at once.
pub const PUSHBACK_DEPTH: usize = 16;

/// Byte reader with a bounded pushback stack.
///
/// The line counter tracks newlines consumed; pushing a newline back
/// decrements it again so that peeking never skews error locations.
#[derive(Debug)]
pub struct Lookahead<'a> {
    input: &'a [u8],
    pos: usize,
    stack: Vec<u8>,
    line: u32,
}

impl<'a> Lookahead<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            pos: 0,
            stack: Vec::with_capacity(PUSHBACK_DEPTH),
            line: 1,
        }
    }

    /// Current 1-based line.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Next byte, or `None` at end of input.
    pub fn next(&mut self) -> Result<Option<u8>, LexErrorKind> {
        let byte = match self.stack.pop() {
            Some(b) => b,
            None => match self.input.get(self.pos) {
                Some(&b) => {
                    self.pos += 1;
                    b
                }
                None => return Ok(None),
            },
        };
        if byte == b'\n' {
            self.line = self.line.checked_add(1).ok_or(LexErrorKind::FileTooLarge)?;
        }
        Ok(Some(byte))
    }

    /// Return a byte so that the next call to [`Lookahead::next`] yields it.
    pub fn push_back(&mut self, byte: u8) -> Result<(), LexErrorKind> {
        if self.stack.len() >= PUSHBACK_DEPTH {
            return Err(LexErrorKind::PushbackOverflow);
        }
        if byte == b'\n' {
            self.line = self.line.saturating_sub(1);
        }
        self.stack.push(byte);
        Ok(())
    }

    /// Look at the next byte without consuming it.
    pub fn peek(&mut self) -> Result<Option<u8>, LexErrorKind> {
        let byte = self.next()?;
        if let Some(b) = byte {
            self.push_back(b)?;
        }
        Ok(byte)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newline_pushback_restores_line() {
        let mut la = Lookahead::new(b"a\nb");
        assert_eq!(la.next().unwrap(), Some(b'a'));
        assert_eq!(la.next().unwrap(), Some(b'\n'));
        assert_eq!(la.line(), 2);
        la.push_back(b'\n').unwrap();
        assert_eq!(la.line(), 1);
        assert_eq!(la.peek().unwrap(), Some(b'\n'));
        assert_eq!(la.line(), 1);
    }

    #[test]
    fn test_pushback_depth_is_bounded() {
        let mut la = Lookahead::new(b"");
        for _ in 0..PUSHBACK_DEPTH {
            la.push_back(b'x').unwrap();
        }
        assert_eq!(la.push_back(b'x'), Err(LexErrorKind::PushbackOverflow));
        assert_eq!(la.next().unwrap(), Some(b'x'));
    }

    #[test]
    fn test_end_of_input() {
        let mut la = Lookahead::new(b"z");
        assert_eq!(la.next().unwrap(), Some(b'z'));
        assert_eq!(la.next().unwrap(), None);
        assert_eq!(la.peek().unwrap(), None);
    }
}
