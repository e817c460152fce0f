/*!
# Filter Predicates

Evaluates `[?(...)]` predicates against a single candidate. Operands are
resolved by running their relative (`@`) or absolute (`$`) paths through the
same span evaluator. An operand takes part in a comparison only when its path
selects exactly one scalar value; anything else makes the comparison false.
*/
use std::borrow::Cow;
use std::cmp::Ordering;

use crate::lexer::{EvalError, Span, ValueKind};
use crate::query::ast::{CmpOp, Literal, Operand, Predicate};
use crate::query::eval::Evaluator;

/// A scalar value, borrowed from the document where possible.
#[derive(Debug, Clone, PartialEq)]
enum Scalar<'a> {
    Number(f64),
    String(Cow<'a, str>),
    Bool(bool),
    Null,
}

impl<'a> Scalar<'a> {
    fn from_literal(literal: &'a Literal) -> Self {
        match literal {
            Literal::Number(n) => Self::Number(*n),
            Literal::String(s) => Self::String(Cow::Borrowed(s.as_str())),
            Literal::Bool(b) => Self::Bool(*b),
            Literal::Null => Self::Null,
        }
    }

    /// Decode the scalar at `span`. Containers and undecodable values give
    /// `None`.
    fn decode(
        evaluator: &Evaluator<'a>,
        span: Span,
    ) -> Result<Option<Self>, EvalError> {
        let raw = span.slice(evaluator.input());
        let scalar = match evaluator.kind(span)? {
            ValueKind::Object | ValueKind::Array => None,
            ValueKind::Null => Some(Self::Null),
            ValueKind::Bool => Some(Self::Bool(raw == b"true")),
            ValueKind::Number => std::str::from_utf8(raw)
                .ok()
                .and_then(|s| s.parse::<f64>().ok())
                .map(Self::Number),
            ValueKind::String => decode_string(raw).map(Self::String),
        };
        Ok(scalar)
    }

    /// Numbers and strings are ordered; booleans and null only support
    /// `==` and `!=`. Operands of different kinds never compare true.
    fn compare(&self, op: CmpOp, other: &Self) -> bool {
        let ordering = match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.partial_cmp(b),
            (Self::String(a), Self::String(b)) => Some(a.cmp(b)),
            (Self::Bool(a), Self::Bool(b)) => {
                return match op {
                    CmpOp::Eq => a == b,
                    CmpOp::Ne => a != b,
                    _ => false,
                };
            }
            (Self::Null, Self::Null) => return op == CmpOp::Eq,
            _ => return false,
        };
        ordering.is_some_and(|o| match op {
            CmpOp::Eq => o == Ordering::Equal,
            CmpOp::Ne => o != Ordering::Equal,
            CmpOp::Lt => o == Ordering::Less,
            CmpOp::Le => o != Ordering::Greater,
            CmpOp::Gt => o == Ordering::Greater,
            CmpOp::Ge => o != Ordering::Less,
        })
    }
}

/// Decode a raw JSON string token, borrowing when it has no escapes.
fn decode_string(raw: &[u8]) -> Option<Cow<'_, str>> {
    let inner = raw.get(1..raw.len().checked_sub(1)?)?;
    if inner.contains(&b'\\') {
        serde_json::from_slice::<String>(raw).ok().map(Cow::Owned)
    } else {
        std::str::from_utf8(inner).ok().map(Cow::Borrowed)
    }
}

/// Whether `candidate` satisfies `predicate`. `&&` and `||` short-circuit.
pub(crate) fn test(
    evaluator: &Evaluator<'_>,
    predicate: &Predicate,
    candidate: Span,
) -> Result<bool, EvalError> {
    match predicate {
        Predicate::Or(lhs, rhs) => Ok(test(evaluator, lhs, candidate)?
            || test(evaluator, rhs, candidate)?),
        Predicate::And(lhs, rhs) => Ok(test(evaluator, lhs, candidate)?
            && test(evaluator, rhs, candidate)?),
        Predicate::Not(inner) => Ok(!test(evaluator, inner, candidate)?),
        Predicate::Exists(operand) => match operand {
            Operand::Literal(_) => Ok(true),
            Operand::Current(_) | Operand::Root(_) => {
                Ok(!select(evaluator, operand, candidate)?.is_empty())
            }
        },
        Predicate::Compare(lhs, op, rhs) => {
            let (Some(lhs), Some(rhs)) = (
                resolve(evaluator, lhs, candidate)?,
                resolve(evaluator, rhs, candidate)?,
            ) else {
                return Ok(false);
            };
            Ok(lhs.compare(*op, &rhs))
        }
        Predicate::Match(operand, pattern) => {
            match resolve(evaluator, operand, candidate)? {
                Some(Scalar::String(text)) => Ok(pattern.is_match(&text)),
                _ => Ok(false),
            }
        }
    }
}

/// Run a query operand's path. Literals select nothing.
fn select(
    evaluator: &Evaluator<'_>,
    operand: &Operand,
    candidate: Span,
) -> Result<Vec<Span>, EvalError> {
    match operand {
        Operand::Current(segments) => evaluator.apply(vec![candidate], segments),
        Operand::Root(segments) => {
            evaluator.apply(vec![evaluator.root()], segments)
        }
        Operand::Literal(_) => Ok(Vec::new()),
    }
}

/// Resolve an operand to a single scalar, or `None` when its path selects
/// zero or several values or a container.
fn resolve<'a>(
    evaluator: &Evaluator<'a>,
    operand: &'a Operand,
    candidate: Span,
) -> Result<Option<Scalar<'a>>, EvalError> {
    if let Operand::Literal(literal) = operand {
        return Ok(Some(Scalar::from_literal(literal)));
    }
    match select(evaluator, operand, candidate)?.as_slice() {
        [span] => Scalar::decode(evaluator, *span),
        _ => Ok(None),
    }
}
