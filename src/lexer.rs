//! # JSON Lexer
//!
//! Byte-oriented scanning over a raw JSON document. Nothing in this module
//! decodes or allocates values: every value is reported as a [`Span`] into the
//! caller's buffer.
pub mod cursor;
pub mod span;

// Re-exports
pub use cursor::{Cursor, Entries, Entry, EvalError, elements, find_key, members};
pub use span::{Span, ValueKind};
