//! Assembles the bytes returned for a set of matches.
use std::io::{self, Write};

use crate::query::common::MatchSet;

/// Render the matches as bytes:
///
/// - no matches: empty output,
/// - one match: the matched value's bytes exactly as they appear in `input`,
/// - otherwise: a JSON array of the matched bytes joined by `,`, with no
///   whitespace added.
///
/// ```
/// use jpslice::query::{JsonPath, QueryEngine, ScanQueryEngine, render};
///
/// let doc = br#"{"a": [1, {"b": 2}]}"#;
/// let path: JsonPath = "$.a[*]".parse().unwrap();
/// let matches = ScanQueryEngine.find(doc, &path).unwrap();
/// assert_eq!(render::render(doc, &matches), br#"[1,{"b": 2}]"#);
/// ```
#[must_use]
pub fn render(input: &[u8], matches: &MatchSet) -> Vec<u8> {
    let mut out = Vec::new();
    // writing into a Vec cannot fail
    let _ = write_matches(&mut out, input, matches);
    out
}

/// Stream the rendered matches into `writer` without building the output in
/// memory first.
///
/// # Errors
///
/// Returns any error from `writer`.
pub fn write_matches<W: Write>(
    writer: &mut W,
    input: &[u8],
    matches: &MatchSet,
) -> io::Result<()> {
    match matches.spans() {
        [] => Ok(()),
        [only] => writer.write_all(only.slice(input)),
        spans => {
            writer.write_all(b"[")?;
            for (i, span) in spans.iter().enumerate() {
                if i > 0 {
                    writer.write_all(b",")?;
                }
                writer.write_all(span.slice(input))?;
            }
            writer.write_all(b"]")
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::lexer::Span;

    const DOC: &[u8] = br#"{"x": [ "A" , {"k": 1} ]}"#;

    #[test]
    fn empty_set_renders_nothing() {
        assert!(render(DOC, &MatchSet::default()).is_empty());
    }

    #[test]
    fn single_match_is_verbatim() {
        let matches = MatchSet::new(vec![Span::new(14, 22)]);
        assert_eq!(render(DOC, &matches), br#"{"k": 1}"#);
    }

    #[test]
    fn many_matches_are_joined() {
        let matches =
            MatchSet::new(vec![Span::new(8, 11), Span::new(14, 22), Span::new(8, 11)]);
        assert_eq!(render(DOC, &matches), br#"["A",{"k": 1},"A"]"#);
    }

    #[test]
    fn streaming_matches_buffered() {
        let matches = MatchSet::new(vec![Span::new(8, 11), Span::new(14, 22)]);
        let mut out = Vec::new();
        write_matches(&mut out, DOC, &matches).unwrap();
        assert_eq!(out, render(DOC, &matches));
    }
}
