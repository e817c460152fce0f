//! # JSONPath Queries
//!
//! A JSONPath dialect evaluated directly over JSON bytes:
//! - Dot and bracket member access, including quoted names
//! - Array indices (negative counts from the end), slices and unions
//! - Wildcards and recursive descent
//! - Filters with comparisons, existence tests, regular expressions and
//!   `&&`/`||`/`!`
//!
//! Evaluation never builds a value tree. Matches are reported as spans into
//! the input, so the bytes returned for a match are exactly the bytes of the
//! document.

pub mod ast;
pub mod common;
pub mod eval;
mod filter;
pub mod parser;
pub mod render;

// Re-exports
pub use ast::*;
pub use common::MatchSet;
pub use eval::{QueryEngine, ScanQueryEngine, evaluate};
pub use parser::*;
