//! # JSON Cursor
//!
//! A cursor over a JSON byte buffer that can classify the value at its
//! position and skip past complete values, plus iterators over the direct
//! children of objects and arrays.
//!
//! Containers are skipped by bracket matching alone: strings are honoured
//! (including escaped quotes) so brackets inside them do not count, but the
//! members are not validated until something iterates over them.
use std::error::Error;
use std::fmt;

use crate::lexer::{Span, ValueKind};

/// Errors raised while scanning a malformed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalError {
    /// The document ended in the middle of a value. Carries the offset at
    /// which more input was expected.
    UnexpectedEndOfInput(usize),
    /// A byte that cannot appear at this position.
    InvalidByte {
        /// Offset of the offending byte
        offset: usize,
        /// The offending byte
        byte: u8,
    },
}

impl Error for EvalError {}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEndOfInput(offset) => {
                write!(f, "Unexpected end of input at offset {offset}")
            }
            Self::InvalidByte { offset, byte } => {
                write!(
                    f,
                    "Invalid byte {:?} at offset {offset}",
                    char::from(*byte)
                )
            }
        }
    }
}

/// A position within a JSON document.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    /// The input sequence of bytes to scan
    input: &'a [u8],
    /// Current position (current byte)
    position: usize,
}

impl<'a> Cursor<'a> {
    /// Creates a cursor at the start of `input`.
    #[must_use]
    pub const fn new(input: &'a [u8]) -> Self {
        Self { input, position: 0 }
    }

    /// Creates a cursor at `position` within `input`.
    #[must_use]
    pub const fn at(input: &'a [u8], position: usize) -> Self {
        Self { input, position }
    }

    /// The current byte offset.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.position).copied()
    }

    const fn bump(&mut self) {
        self.position += 1;
    }

    /// Returns the current byte, or `UnexpectedEndOfInput` at the end of the
    /// buffer.
    fn expect_more(&self) -> Result<u8, EvalError> {
        self.peek()
            .ok_or(EvalError::UnexpectedEndOfInput(self.position))
    }

    /// The error for the current position when what is there is unusable.
    fn unexpected(&self) -> EvalError {
        match self.peek() {
            Some(byte) => EvalError::InvalidByte { offset: self.position, byte },
            None => EvalError::UnexpectedEndOfInput(self.position),
        }
    }

    /// Consume whitespace byte(s) starting from the current position.
    pub fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.bump();
        }
    }

    /// Classify the value that begins at the current position.
    ///
    /// # Errors
    ///
    /// `UnexpectedEndOfInput` at the end of the buffer, `InvalidByte` when the
    /// current byte cannot start a value.
    pub fn classify(&self) -> Result<ValueKind, EvalError> {
        let byte = self.expect_more()?;
        ValueKind::from_leading_byte(byte).ok_or(EvalError::InvalidByte {
            offset: self.position,
            byte,
        })
    }

    /// Advance past the complete value at the current position and return the
    /// offset just after it.
    ///
    /// # Errors
    ///
    /// Returns an [`EvalError`] if the value is truncated or malformed.
    pub fn skip_value(&mut self) -> Result<usize, EvalError> {
        match self.classify()? {
            ValueKind::Object | ValueKind::Array => self.skip_container()?,
            ValueKind::String => self.skip_string()?,
            ValueKind::Number => self.skip_number()?,
            ValueKind::Bool | ValueKind::Null => self.skip_literal()?,
        }
        Ok(self.position)
    }

    /// Skip the value at the current position and return its span.
    ///
    /// # Errors
    ///
    /// Returns an [`EvalError`] if the value is truncated or malformed.
    pub fn read_value(&mut self) -> Result<Span, EvalError> {
        let start = self.position;
        let end = self.skip_value()?;
        Ok(Span::new(start, end))
    }

    /// Skips a string, including both quotes.
    fn skip_string(&mut self) -> Result<(), EvalError> {
        // opening quote
        self.bump();
        loop {
            match self.expect_more()? {
                b'"' => {
                    self.bump();
                    return Ok(());
                }
                b'\\' => {
                    // skip the escaped byte so `\"` does not terminate
                    self.bump();
                    self.expect_more()?;
                    self.bump();
                }
                _ => self.bump(),
            }
        }
    }

    /// Consumes ASCII digits, returning how many were read.
    fn skip_digits(&mut self) -> usize {
        let start = self.position;
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.bump();
        }
        self.position - start
    }

    /// Skips a JSON number (int, frac, exp).
    fn skip_number(&mut self) -> Result<(), EvalError> {
        if self.peek() == Some(b'-') {
            self.bump();
        }
        if self.skip_digits() == 0 {
            return Err(self.unexpected());
        }
        if self.peek() == Some(b'.') {
            self.bump();
            if self.skip_digits() == 0 {
                return Err(self.unexpected());
            }
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            self.bump();
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.bump();
            }
            if self.skip_digits() == 0 {
                return Err(self.unexpected());
            }
        }
        Ok(())
    }

    /// Skips `true`, `false` or `null`.
    fn skip_literal(&mut self) -> Result<(), EvalError> {
        let word: &[u8] = match self.peek() {
            Some(b't') => b"true",
            Some(b'f') => b"false",
            _ => b"null",
        };
        for &expected in word {
            if self.expect_more()? != expected {
                return Err(self.unexpected());
            }
            self.bump();
        }
        Ok(())
    }

    /// Skips an object or array by matching brackets.
    fn skip_container(&mut self) -> Result<(), EvalError> {
        let mut closers: Vec<u8> = Vec::new();
        loop {
            let byte = self.expect_more()?;
            match byte {
                b'{' => {
                    closers.push(b'}');
                    self.bump();
                }
                b'[' => {
                    closers.push(b']');
                    self.bump();
                }
                b'}' | b']' => {
                    if closers.pop() != Some(byte) {
                        return Err(self.unexpected());
                    }
                    self.bump();
                    if closers.is_empty() {
                        return Ok(());
                    }
                }
                b'"' => self.skip_string()?,
                _ => self.bump(),
            }
        }
    }
}

/// One direct child of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    /// Span of the member key (quotes included); `None` for array elements
    pub key: Option<Span>,
    /// Span of the child value
    pub value: Span,
}

/// Iterator over the direct children of an object or array, in document
/// order. Structural errors end the iteration after being yielded once.
#[derive(Debug, Clone)]
pub struct Entries<'a> {
    cursor: Cursor<'a>,
    /// `}` for objects, `]` for arrays
    closer: u8,
    /// Whether no entry has been read yet
    first: bool,
    done: bool,
}

/// Iterate over the members of the object at `object`.
///
/// The span must begin with `{`; use [`Cursor::classify`] first.
#[must_use]
pub const fn members(input: &[u8], object: Span) -> Entries<'_> {
    Entries::new(input, object, b'}')
}

/// Iterate over the elements of the array at `array`.
///
/// The span must begin with `[`; use [`Cursor::classify`] first.
#[must_use]
pub const fn elements(input: &[u8], array: Span) -> Entries<'_> {
    Entries::new(input, array, b']')
}

impl<'a> Entries<'a> {
    const fn new(input: &'a [u8], container: Span, closer: u8) -> Self {
        Self {
            cursor: Cursor::at(input, container.start + 1),
            closer,
            first: true,
            done: false,
        }
    }

    fn advance(&mut self) -> Result<Option<Entry>, EvalError> {
        let cursor = &mut self.cursor;
        cursor.skip_whitespace();

        if self.first {
            self.first = false;
            if cursor.expect_more()? == self.closer {
                return Ok(None);
            }
        } else {
            match cursor.expect_more()? {
                b',' => {
                    cursor.bump();
                    cursor.skip_whitespace();
                }
                byte if byte == self.closer => return Ok(None),
                _ => return Err(cursor.unexpected()),
            }
        }

        let key = if self.closer == b'}' {
            if cursor.expect_more()? != b'"' {
                return Err(cursor.unexpected());
            }
            let key = cursor.read_value()?;
            cursor.skip_whitespace();
            if cursor.expect_more()? != b':' {
                return Err(cursor.unexpected());
            }
            cursor.bump();
            cursor.skip_whitespace();
            Some(key)
        } else {
            None
        };

        let value = cursor.read_value()?;
        Ok(Some(Entry { key, value }))
    }
}

impl Iterator for Entries<'_> {
    type Item = Result<Entry, EvalError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.advance() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Whether the raw key at `key` (quotes included) is exactly `name`.
///
/// Keys are compared as raw bytes. A key containing an escape sequence never
/// matches, even when it would decode to `name`.
#[must_use]
pub fn key_matches(input: &[u8], key: Span, name: &str) -> bool {
    let raw = &input[key.start + 1..key.end - 1];
    !raw.contains(&b'\\') && raw == name.as_bytes()
}

/// Find the value of the first member of the object at `object` whose key is
/// `name`. Only direct members are examined.
///
/// # Errors
///
/// Returns an [`EvalError`] if a malformed member is reached before a match.
pub fn find_key(
    input: &[u8],
    object: Span,
    name: &str,
) -> Result<Option<Span>, EvalError> {
    for entry in members(input, object) {
        let entry = entry?;
        if let Some(key) = entry.key
            && key_matches(input, key, name)
        {
            return Ok(Some(entry.value));
        }
    }
    Ok(None)
}
