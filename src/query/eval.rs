/*!
# Span Evaluator

Evaluates a parsed [`JsonPath`] directly over a JSON byte buffer. Nothing is
decoded into a value tree: candidates are [`Span`]s into the input and every
segment maps the current worklist of candidates to the next one.

Missing members, out-of-range indices and kind mismatches (e.g. `.name` on an
array) drop the candidate. The only errors are structural problems found while
scanning the document.
*/
use crate::lexer::{
    Cursor, EvalError, Span, ValueKind, elements, find_key, members,
};
use crate::query::ast::{JsonPath, Segment, UnionMember};
use crate::query::common::MatchSet;
use crate::query::filter;

/// Interface for query engine implementations.
pub trait QueryEngine {
    /// Finds the spans of all values in `input` matched by `path`, in
    /// document traversal order.
    ///
    /// # Errors
    ///
    /// Returns an [`EvalError`] when the document is malformed where it is
    /// scanned.
    fn find(&self, input: &[u8], path: &JsonPath) -> Result<MatchSet, EvalError>;
}

/// A [`QueryEngine`] that scans the raw bytes of the document.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanQueryEngine;

impl QueryEngine for ScanQueryEngine {
    fn find(&self, input: &[u8], path: &JsonPath) -> Result<MatchSet, EvalError> {
        let matches = evaluate(input, path.segments())?;
        log::debug!("`{path}` matched {} value(s)", matches.len());
        Ok(matches)
    }
}

/// Evaluate `segments` against `input`.
///
/// # Errors
///
/// Returns an [`EvalError`] when the document is malformed where it is
/// scanned.
pub fn evaluate(input: &[u8], segments: &[Segment]) -> Result<MatchSet, EvalError> {
    let evaluator = Evaluator::new(input)?;
    let spans = evaluator.apply(vec![evaluator.root()], segments)?;
    Ok(MatchSet::new(spans))
}

impl JsonPath {
    /// Match this path against `input` with the [`ScanQueryEngine`].
    ///
    /// # Errors
    ///
    /// Returns an [`EvalError`] when the document is malformed where it is
    /// scanned.
    pub fn select(&self, input: &[u8]) -> Result<MatchSet, EvalError> {
        ScanQueryEngine.find(input, self)
    }
}

/// Evaluation state for one document: the buffer and the span of its
/// top-level value.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Evaluator<'a> {
    input: &'a [u8],
    root: Span,
}

impl<'a> Evaluator<'a> {
    /// Locate the top-level value. Leading whitespace is skipped and bytes
    /// after the value are ignored.
    pub(crate) fn new(input: &'a [u8]) -> Result<Self, EvalError> {
        let mut cursor = Cursor::new(input);
        cursor.skip_whitespace();
        let root = cursor.read_value()?;
        log::trace!("document root spans {root}");
        Ok(Self { input, root })
    }

    pub(crate) const fn input(&self) -> &'a [u8] {
        self.input
    }

    pub(crate) const fn root(&self) -> Span {
        self.root
    }

    /// Run `segments` left to right starting from `seed`.
    pub(crate) fn apply(
        &self,
        seed: Vec<Span>,
        segments: &[Segment],
    ) -> Result<Vec<Span>, EvalError> {
        let mut worklist = seed;
        for segment in segments {
            if worklist.is_empty() {
                break;
            }
            let mut next = Vec::with_capacity(worklist.len());
            for &candidate in &worklist {
                self.step(candidate, segment, &mut next)?;
            }
            log::trace!(
                "{segment}: {} candidate(s) -> {}",
                worklist.len(),
                next.len()
            );
            worklist = next;
        }
        Ok(worklist)
    }

    /// The kind of the value at `span`.
    pub(crate) fn kind(&self, span: Span) -> Result<ValueKind, EvalError> {
        Cursor::at(self.input, span.start).classify()
    }

    /// Apply one segment to one candidate, pushing the resulting candidates.
    fn step(
        &self,
        candidate: Span,
        segment: &Segment,
        out: &mut Vec<Span>,
    ) -> Result<(), EvalError> {
        match segment {
            Segment::Field(name) => self.select_field(candidate, name, out),
            Segment::Wildcard => self.children(candidate, out),
            Segment::Index(idx) => self.select_index(candidate, *idx, out),
            Segment::Slice { start, end, step } => {
                self.select_slice(candidate, *start, *end, *step, out)
            }
            Segment::Union(union) => {
                for member in union {
                    match member {
                        UnionMember::Field(name) => {
                            self.select_field(candidate, name, out)?;
                        }
                        UnionMember::Index(idx) => {
                            self.select_index(candidate, *idx, out)?;
                        }
                    }
                }
                Ok(())
            }
            Segment::RecursiveDescent => self.descendants(candidate, out),
            Segment::Filter(predicate) => {
                let mut children = Vec::new();
                self.children(candidate, &mut children)?;
                for child in children {
                    if filter::test(self, predicate, child)? {
                        out.push(child);
                    }
                }
                Ok(())
            }
        }
    }

    fn select_field(
        &self,
        candidate: Span,
        name: &str,
        out: &mut Vec<Span>,
    ) -> Result<(), EvalError> {
        if self.kind(candidate)? == ValueKind::Object
            && let Some(value) = find_key(self.input, candidate, name)?
        {
            out.push(value);
        }
        Ok(())
    }

    fn select_index(
        &self,
        candidate: Span,
        idx: i64,
        out: &mut Vec<Span>,
    ) -> Result<(), EvalError> {
        if self.kind(candidate)? != ValueKind::Array {
            return Ok(());
        }
        if let Ok(idx) = usize::try_from(idx) {
            for (i, element) in elements(self.input, candidate).enumerate() {
                let element = element?;
                if i == idx {
                    out.push(element.value);
                    break;
                }
            }
            return Ok(());
        }
        // negative: count from the end
        let all = elements(self.input, candidate)
            .map(|e| e.map(|e| e.value))
            .collect::<Result<Vec<_>, _>>()?;
        let from_end = usize::try_from(idx.unsigned_abs()).unwrap_or(usize::MAX);
        if let Some(pos) = all.len().checked_sub(from_end) {
            out.push(all[pos]);
        }
        Ok(())
    }

    fn select_slice(
        &self,
        candidate: Span,
        start: Option<i64>,
        end: Option<i64>,
        step: Option<i64>,
        out: &mut Vec<Span>,
    ) -> Result<(), EvalError> {
        if self.kind(candidate)? != ValueKind::Array {
            return Ok(());
        }
        let all = elements(self.input, candidate)
            .map(|e| e.map(|e| e.value))
            .collect::<Result<Vec<_>, _>>()?;
        out.extend(slice_indices(all.len(), start, end, step).map(|i| all[i]));
        Ok(())
    }

    /// Push the direct children of an object (member values, in key order)
    /// or array (elements, in index order). Scalars have none.
    pub(crate) fn children(
        &self,
        candidate: Span,
        out: &mut Vec<Span>,
    ) -> Result<(), EvalError> {
        let entries = match self.kind(candidate)? {
            ValueKind::Object => members(self.input, candidate),
            ValueKind::Array => elements(self.input, candidate),
            _ => return Ok(()),
        };
        for entry in entries {
            out.push(entry?.value);
        }
        Ok(())
    }

    /// Push `candidate` and every value below it, depth-first pre-order.
    fn descendants(
        &self,
        candidate: Span,
        out: &mut Vec<Span>,
    ) -> Result<(), EvalError> {
        let mut stack = vec![candidate];
        let mut children = Vec::new();
        while let Some(node) = stack.pop() {
            out.push(node);
            children.clear();
            self.children(node, &mut children)?;
            stack.extend(children.iter().rev());
        }
        Ok(())
    }
}

/// Indices selected by a slice over an array of `len` elements.
///
/// Negative bounds count from the end. With a positive step the defaults are
/// `0` and `len`; with a negative step the walk starts at the last element
/// and runs down to index 0. Bounds are clamped to the array.
pub(crate) fn slice_indices(
    len: usize,
    start: Option<i64>,
    end: Option<i64>,
    step: Option<i64>,
) -> impl Iterator<Item = usize> {
    let len = i64::try_from(len).unwrap_or(i64::MAX);
    let step = step.unwrap_or(1);
    let normalize = |i: i64| if i < 0 { len.saturating_add(i) } else { i };

    let (first, bound) = match step {
        0 => (0, 0),
        s if s > 0 => (
            start.map_or(0, normalize).clamp(0, len),
            end.map_or(len, normalize).clamp(0, len),
        ),
        _ => (
            start.map_or(len - 1, normalize).clamp(-1, len - 1),
            end.map_or(-1, normalize).clamp(-1, len - 1),
        ),
    };

    std::iter::successors(Some(first), move |&i| i.checked_add(step))
        .take_while(move |&i| match step {
            0 => false,
            s if s > 0 => i < bound,
            _ => i > bound,
        })
        .filter_map(|i| usize::try_from(i).ok())
}
