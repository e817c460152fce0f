/*!
# `jpslice` Library

Runs JSONPath queries against raw JSON bytes and returns the matched values as
slices of the original document.

```
let doc = br#"{"x":[{"id":"A"},{"id":"B"}]}"#;

assert_eq!(jpslice::query(doc, "$.x[1].id").unwrap(), br#""B""#);
assert_eq!(jpslice::query(doc, "$.x[*].id").unwrap(), br#"["A","B"]"#);
assert_eq!(jpslice::query(doc, r#"$.x[?(@.id == "A")].id"#).unwrap(), br#""A""#);
assert!(jpslice::query(doc, "$.y").unwrap().is_empty());
```
*/
use std::error;
use std::fmt;

pub mod commands;
pub mod lexer;
pub mod query;
pub mod utils;

use lexer::EvalError;
use query::{JsonPath, ParseError, render};

/// Errors returned by [`query()`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The path could not be parsed.
    Parse(ParseError),
    /// The document is malformed where it was scanned.
    Eval(EvalError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid path: {err}"),
            Self::Eval(err) => write!(f, "invalid document: {err}"),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Eval(err) => Some(err),
        }
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Self::Parse(err)
    }
}

impl From<EvalError> for Error {
    fn from(err: EvalError) -> Self {
        Self::Eval(err)
    }
}

/// Evaluate `path` against `document` and return the matched bytes.
///
/// No matches yields an empty buffer, a single match yields the matched
/// value's bytes verbatim, and several matches yield a JSON array of them
/// joined by `,` in document order.
///
/// # Errors
///
/// [`Error::Parse`] when `path` is not a valid path and [`Error::Eval`] when
/// `document` is malformed in a part the evaluation had to scan.
pub fn query(document: &[u8], path: &str) -> Result<Vec<u8>, Error> {
    let path = JsonPath::parse(path)?;
    let matches = path.select(document)?;
    Ok(render::render(document, &matches))
}
