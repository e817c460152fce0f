//! # Spans and Value Kinds
//!
//! Defines the borrowed view of a JSON value (a byte range into the input) and
//! the classification of the byte that starts it.
use serde::Serialize;
use std::fmt::Display;
use std::ops::Range;

/// A half-open byte interval `[start, end)` into an input buffer denoting one
/// complete JSON value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    /// Offset of the first byte of the value
    pub start: usize,
    /// Offset one past the last byte of the value
    pub end: usize,
}

impl Span {
    /// Creates a new span over `[start, end)`.
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of bytes covered by the span.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the span covers no bytes.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The span as a `Range` usable for slicing.
    #[must_use]
    pub const fn as_range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Borrow the bytes of this span out of `input`.
    ///
    /// # Panics
    ///
    /// Panics if the span does not lie within `input`. Spans produced by the
    /// scanner over `input` always do.
    #[must_use]
    pub fn slice<'a>(&self, input: &'a [u8]) -> &'a [u8] {
        &input[self.as_range()]
    }
}

impl Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}..{})", self.start, self.end)
    }
}

/// The kind of JSON value that begins at a given byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// `{`
    Object,
    /// `[`
    Array,
    /// `"`
    String,
    /// `-` or a digit
    Number,
    /// `t` or `f`
    Bool,
    /// `n`
    Null,
}

impl ValueKind {
    /// Classify the leading byte of a value, or `None` if no JSON value can
    /// start with it.
    #[must_use]
    pub const fn from_leading_byte(byte: u8) -> Option<Self> {
        match byte {
            b'{' => Some(Self::Object),
            b'[' => Some(Self::Array),
            b'"' => Some(Self::String),
            b'-' | b'0'..=b'9' => Some(Self::Number),
            b't' | b'f' => Some(Self::Bool),
            b'n' => Some(Self::Null),
            _ => None,
        }
    }

    /// Whether values of this kind have children.
    #[must_use]
    pub const fn is_container(self) -> bool {
        matches!(self, Self::Object | Self::Array)
    }
}

impl Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Object => write!(f, "object"),
            Self::Array => write!(f, "array"),
            Self::String => write!(f, "string"),
            Self::Number => write!(f, "number"),
            Self::Bool => write!(f, "boolean"),
            Self::Null => write!(f, "null"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_bytes() {
        let cases = [
            (b'{', Some(ValueKind::Object)),
            (b'[', Some(ValueKind::Array)),
            (b'"', Some(ValueKind::String)),
            (b'-', Some(ValueKind::Number)),
            (b'7', Some(ValueKind::Number)),
            (b't', Some(ValueKind::Bool)),
            (b'f', Some(ValueKind::Bool)),
            (b'n', Some(ValueKind::Null)),
            (b'}', None),
            (b'x', None),
        ];
        for (byte, expected) in cases {
            assert_eq!(ValueKind::from_leading_byte(byte), expected);
        }
    }

    #[test]
    fn span_slicing() {
        let input = br#"{"a": 12}"#;
        let span = Span::new(6, 8);
        assert_eq!(span.slice(input), b"12");
        assert_eq!(span.len(), 2);
        assert!(!span.is_empty());
        assert_eq!(span.to_string(), "[6..8)");
    }
}
