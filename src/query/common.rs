/*!
# Shared Types

The result of evaluating a path: an ordered list of spans into the document
that was queried.
*/
use serde::Serialize;

use crate::lexer::Span;

/// Ordered matches of a path against a document, in document traversal
/// order. Duplicates (e.g. from unions) are preserved.
///
/// Only the evaluator constructs a `MatchSet`, so every span lies within the
/// buffer that was evaluated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MatchSet {
    spans: Vec<Span>,
}

impl MatchSet {
    pub(crate) const fn new(spans: Vec<Span>) -> Self {
        Self { spans }
    }

    /// Number of matches.
    #[must_use]
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Whether nothing matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// The matched spans.
    #[must_use]
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Iterate over the matched spans.
    pub fn iter(&self) -> std::slice::Iter<'_, Span> {
        self.spans.iter()
    }

    /// Borrow each match out of `input`, which must be the buffer the set
    /// was evaluated against.
    pub fn values<'a>(
        &'a self,
        input: &'a [u8],
    ) -> impl Iterator<Item = &'a [u8]> + 'a {
        self.spans.iter().map(move |span| span.slice(input))
    }
}

impl<'a> IntoIterator for &'a MatchSet {
    type Item = &'a Span;
    type IntoIter = std::slice::Iter<'a, Span>;

    fn into_iter(self) -> Self::IntoIter {
        self.spans.iter()
    }
}
