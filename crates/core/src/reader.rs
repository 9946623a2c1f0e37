//! Cursor-based scanner over a single command line.
//!
//! A [`StringReader`] never consumes speculatively: every failing read either
//! leaves the cursor where it was or rewinds it to the start of the offending
//! token, so callers backtrack simply by restoring a saved cursor.

use std::str::FromStr;
use std::sync::Arc;

use crate::error::{CommandSyntaxError, ErrorKind};

/// The single character separating tokens.
pub const ARGUMENT_SEPARATOR: char = ' ';

const SYNTAX_ESCAPE: char = '\\';
const SYNTAX_DOUBLE_QUOTE: char = '"';

/// Immutable input plus a mutable byte cursor.
///
/// Cloning is cheap: the input is shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringReader {
    string: Arc<str>,
    cursor: usize,
}

impl StringReader {
    /// A reader positioned at the start of `input`.
    pub fn new(input: impl Into<Arc<str>>) -> Self {
        Self {
            string: input.into(),
            cursor: 0,
        }
    }

    /// The full input.
    pub fn string(&self) -> &str {
        &self.string
    }

    /// Current byte offset.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Move the cursor. Offsets past the end are clamped.
    pub fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor.min(self.string.len());
    }

    /// Bytes left to read.
    pub fn remaining_length(&self) -> usize {
        self.string.len() - self.cursor
    }

    /// Length of the whole input in bytes.
    pub fn total_length(&self) -> usize {
        self.string.len()
    }

    /// Everything before the cursor.
    pub fn read(&self) -> &str {
        &self.string[..self.cursor]
    }

    /// Everything from the cursor on.
    pub fn remaining(&self) -> &str {
        &self.string[self.cursor..]
    }

    /// True while at least one byte is left.
    pub fn can_read(&self) -> bool {
        self.can_read_n(1)
    }

    /// True while at least `length` bytes are left.
    pub fn can_read_n(&self, length: usize) -> bool {
        self.cursor + length <= self.string.len()
    }

    /// The character under the cursor.
    pub fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    /// The character `offset` bytes past the cursor.
    pub fn peek_at(&self, offset: usize) -> Option<char> {
        self.string.get(self.cursor + offset..)?.chars().next()
    }

    /// Consume and return the character under the cursor.
    pub fn read_char(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.cursor += c.len_utf8();
        Some(c)
    }

    /// Step over the character under the cursor.
    pub fn skip(&mut self) {
        self.read_char();
    }

    /// Step over any run of whitespace.
    pub fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.skip();
        }
    }

    /// Characters accepted in a numeric run.
    pub fn is_allowed_number(c: char) -> bool {
        c.is_ascii_digit() || c == '.' || c == '-'
    }

    /// Characters that open a quoted string.
    pub fn is_quoted_string_start(c: char) -> bool {
        c == SYNTAX_DOUBLE_QUOTE
    }

    /// Characters accepted in an unquoted word.
    pub fn is_allowed_in_unquoted_string(c: char) -> bool {
        c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '+')
    }

    fn read_number<T: FromStr>(
        &mut self,
        expected: ErrorKind,
        invalid: fn(String) -> ErrorKind,
    ) -> Result<T, CommandSyntaxError> {
        let start = self.cursor;
        while self.peek().is_some_and(Self::is_allowed_number) {
            self.skip();
        }
        let number = &self.string[start..self.cursor];
        if number.is_empty() {
            return Err(expected.create_with_context(self));
        }
        match number.parse::<T>() {
            Ok(value) => Ok(value),
            Err(_) => {
                let value = number.to_string();
                self.cursor = start;
                Err(invalid(value).create_with_context(self))
            }
        }
    }

    /// Read an `i32`.
    pub fn read_int(&mut self) -> Result<i32, CommandSyntaxError> {
        self.read_number(ErrorKind::ExpectedInt, |value| ErrorKind::InvalidInt {
            value,
        })
    }

    /// Read an `i64`.
    pub fn read_long(&mut self) -> Result<i64, CommandSyntaxError> {
        self.read_number(ErrorKind::ExpectedLong, |value| ErrorKind::InvalidLong {
            value,
        })
    }

    /// Read an `f32`.
    pub fn read_float(&mut self) -> Result<f32, CommandSyntaxError> {
        self.read_number(ErrorKind::ExpectedFloat, |value| ErrorKind::InvalidFloat {
            value,
        })
    }

    /// Read an `f64`.
    pub fn read_double(&mut self) -> Result<f64, CommandSyntaxError> {
        self.read_number(ErrorKind::ExpectedDouble, |value| {
            ErrorKind::InvalidDouble { value }
        })
    }

    /// Read the longest run of unquoted-word characters. May be empty.
    pub fn read_unquoted_string(&mut self) -> &str {
        let start = self.cursor;
        while self.peek().is_some_and(Self::is_allowed_in_unquoted_string) {
            self.skip();
        }
        &self.string[start..self.cursor]
    }

    /// Read a `"`-delimited string, unescaping `\"` and `\\`.
    ///
    /// Returns an empty string at end of input.
    pub fn read_quoted_string(&mut self) -> Result<String, CommandSyntaxError> {
        let Some(next) = self.peek() else {
            return Ok(String::new());
        };
        if !Self::is_quoted_string_start(next) {
            return Err(ErrorKind::ExpectedStartOfQuote.create_with_context(self));
        }
        self.skip();
        self.read_string_until(next)
    }

    /// Read up to and including `terminator`, returning the unescaped text before it.
    pub fn read_string_until(&mut self, terminator: char) -> Result<String, CommandSyntaxError> {
        let mut result = String::new();
        let mut escaped = false;
        while let Some(c) = self.peek() {
            let at = self.cursor;
            self.skip();
            if escaped {
                if c == terminator || c == SYNTAX_ESCAPE {
                    result.push(c);
                    escaped = false;
                } else {
                    self.cursor = at;
                    return Err(ErrorKind::InvalidEscape { character: c }.create_with_context(self));
                }
            } else if c == SYNTAX_ESCAPE {
                escaped = true;
            } else if c == terminator {
                return Ok(result);
            } else {
                result.push(c);
            }
        }
        Err(ErrorKind::ExpectedEndOfQuote.create_with_context(self))
    }

    /// Read a quoted string if one starts here, otherwise an unquoted word.
    pub fn read_string(&mut self) -> Result<String, CommandSyntaxError> {
        match self.peek() {
            None => Ok(String::new()),
            Some(next) if Self::is_quoted_string_start(next) => {
                self.skip();
                self.read_string_until(next)
            }
            Some(_) => Ok(self.read_unquoted_string().to_string()),
        }
    }

    /// Read `true` or `false` (case-sensitive).
    pub fn read_boolean(&mut self) -> Result<bool, CommandSyntaxError> {
        let start = self.cursor;
        let value = self.read_string()?;
        match value.as_str() {
            "" => Err(ErrorKind::ExpectedBool.create_with_context(self)),
            "true" => Ok(true),
            "false" => Ok(false),
            _ => {
                self.cursor = start;
                Err(ErrorKind::InvalidBool { value }.create_with_context(self))
            }
        }
    }

    /// Consume `c` or fail without moving.
    pub fn expect(&mut self, c: char) -> Result<(), CommandSyntaxError> {
        if self.peek() != Some(c) {
            return Err(ErrorKind::ExpectedSymbol { symbol: c }.create_with_context(self));
        }
        self.skip();
        Ok(())
    }
}
