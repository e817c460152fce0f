/*!
# Path Parser

Parser for converting JSONPath query strings into [`JsonPath`] objects.

## Examples

This module exposes the public API method [`parse_path`] that can be used to
convert raw query strings into [`JsonPath`] objects.

For example, we can construct the associated [`JsonPath`] for the query string
`$.x[?(@.id == "A")].id` as so:

```rust
use jpslice::query::{JsonPath, parser};
let query = r#"$.x[?(@.id == "A")].id"#;
let parsed: JsonPath = parser::parse_path(query).expect("Invalid query string");
assert_eq!(query, parsed.to_string());
```

## Errors

If the input query string is invalid, [`parse_path`] returns a [`ParseError`]
describing how the parsing failed:

```rust
use jpslice::query::parser::{self, ParseError};

let result = parser::parse_path("$.key-with-dash");
assert!(matches!(result, Err(ParseError::InvalidFieldName(_))));
```

```rust
use jpslice::query::parser::{self, ParseError};

let result = parser::parse_path("$[");
assert!(matches!(result, Err(ParseError::UnterminatedBracket(1))));
```

## See Also

- [`JsonPath`]: The parsed path.
- [`ParseError`]: The error type for failed parses.
*/

use pest::Parser;
use pest::error::InputLocation;
use pest::iterators::{Pair, Pairs};
use pest_derive::Parser;
use std::error::Error;
use std::fmt;

use crate::query::ast::{
    CmpOp, JsonPath, Literal, Operand, Pattern, Predicate, Segment,
    UnionMember, is_plain_field,
};

/// Parser for turning raw query strings into [`JsonPath`] objects.
#[derive(Parser)]
#[grammar = "query/grammar/jsonpath.pest"]
pub struct JsonPathParser;

/// Represents errors that can occur while parsing a query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Unexpected token encountered during parsing.
    UnexpectedToken(String),
    /// A dotted field name using characters outside `[A-Za-z0-9_]`.
    InvalidFieldName(String),
    /// A slice with a step of zero.
    EmptyStep,
    /// A `[` that is never closed. Carries its byte offset.
    UnterminatedBracket(usize),
    /// A `[?(` filter that is never closed. Carries the offset of its `[`.
    UnterminatedFilter(usize),
    /// A `=~` pattern that does not compile.
    InvalidRegex(String),
}

impl Error for ParseError {}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedToken(token) => {
                write!(f, "Unexpected token: {token}")
            }
            Self::InvalidFieldName(name) => write!(
                f,
                "Invalid field name `{name}`: use bracket notation [\"{name}\"]"
            ),
            Self::EmptyStep => write!(f, "Slice step cannot be zero"),
            Self::UnterminatedBracket(offset) => {
                write!(f, "Unterminated bracket opened at offset {offset}")
            }
            Self::UnterminatedFilter(offset) => {
                write!(f, "Unterminated filter opened at offset {offset}")
            }
            Self::InvalidRegex(reason) => {
                write!(f, "Invalid regular expression: {reason}")
            }
        }
    }
}

/// Parse an input query string into a [`JsonPath`]. Leading and trailing
/// whitespace is ignored.
///
/// # Errors
///
/// Returns a [`ParseError`] describing how the parsing failed.
pub fn parse_path(input: &str) -> Result<JsonPath, ParseError> {
    let input = input.trim();
    check_brackets(input)?;

    let mut pairs = JsonPathParser::parse(Rule::path, input)
        .map_err(unexpected_input)?;
    let path = pairs.next().ok_or_else(|| {
        ParseError::UnexpectedToken("empty query".to_string())
    })?;

    let segments = parse_segments(path.into_inner())?;
    log::debug!("parsed `{input}` into {} segment(s)", segments.len());

    Ok(JsonPath::from(segments))
}

/// Kinds of open delimiters tracked by [`check_brackets`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Bracket,
    Paren,
    Filter,
}

/// Report unclosed brackets and filters before handing the query to pest,
/// whose errors cannot tell the two apart. Quoted strings and regex literals
/// are skipped. Stray closers are left for the grammar to reject.
fn check_brackets(query: &str) -> Result<(), ParseError> {
    // (kind, offset of the `[` that opened it)
    let mut frames: Vec<(Frame, usize)> = Vec::new();
    let mut quote: Option<u8> = None;
    let mut in_regex = false;
    let mut escaped = false;
    // last two non-whitespace bytes
    let mut prev = [0u8; 2];

    for (pos, &byte) in query.as_bytes().iter().enumerate() {
        if quote.is_some() || in_regex {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if Some(byte) == quote {
                quote = None;
            } else if in_regex && byte == b'/' {
                in_regex = false;
            }
            continue;
        }

        match byte {
            b'"' | b'\'' => quote = Some(byte),
            b'/' if prev == [b'=', b'~'] => in_regex = true,
            b'[' => frames.push((Frame::Bracket, pos)),
            b'(' => match frames.last() {
                Some(&(Frame::Bracket, opened)) if prev[1] == b'?' => {
                    frames.push((Frame::Filter, opened));
                }
                _ => frames.push((Frame::Paren, pos)),
            },
            b')' => {
                if matches!(
                    frames.last(),
                    Some((Frame::Paren | Frame::Filter, _))
                ) {
                    frames.pop();
                }
            }
            b']' => match frames.last() {
                Some((Frame::Bracket, _)) => {
                    frames.pop();
                }
                Some(_) => return Err(unterminated(&frames)),
                None => {}
            },
            _ => {}
        }

        if !byte.is_ascii_whitespace() {
            prev = [prev[1], byte];
        }
    }

    if frames.is_empty() {
        Ok(())
    } else {
        Err(unterminated(&frames))
    }
}

/// The error for the outermost unclosed filter, or else the outermost
/// unclosed bracket.
fn unterminated(frames: &[(Frame, usize)]) -> ParseError {
    if let Some(&(_, opened)) =
        frames.iter().find(|(kind, _)| *kind == Frame::Filter)
    {
        return ParseError::UnterminatedFilter(opened);
    }
    let opened = frames
        .iter()
        .find(|(kind, _)| *kind == Frame::Bracket)
        .map_or(0, |&(_, opened)| opened);
    ParseError::UnterminatedBracket(opened)
}

/// Convert a pest failure into an `UnexpectedToken` with readable rule names.
fn unexpected_input(err: pest::error::Error<Rule>) -> ParseError {
    let offset = match err.location {
        InputLocation::Pos(pos) => pos,
        InputLocation::Span((start, _)) => start,
    };
    let err = err.renamed_rules(|rule| match rule {
        Rule::EOI => "end of query".to_string(),
        Rule::root => "`$`".to_string(),
        Rule::descendant => "`..`".to_string(),
        Rule::child => "`.`".to_string(),
        Rule::bracket => "`[`".to_string(),
        Rule::field_name => "field name".to_string(),
        Rule::wildcard => "`*`".to_string(),
        Rule::cmp_op => "comparison operator".to_string(),
        Rule::logical_or | Rule::logical_and => "predicate".to_string(),
        Rule::int | Rule::index => "integer".to_string(),
        other => format!("{other:?}"),
    });
    ParseError::UnexpectedToken(format!(
        "{} at offset {offset}",
        err.variant.message()
    ))
}

fn unexpected_rule(expected: &str, pair: &Pair<'_, Rule>) -> ParseError {
    ParseError::UnexpectedToken(format!(
        "Expected {expected}, got {:?}",
        pair.as_rule()
    ))
}

/// The first inner pair of `pair`.
fn first_inner(pair: Pair<'_, Rule>) -> Result<Pair<'_, Rule>, ParseError> {
    let rule = pair.as_rule();
    pair.into_inner().next().ok_or_else(|| {
        ParseError::UnexpectedToken(format!("Empty {rule:?}"))
    })
}

/// Parse the segment pairs of a path or a filter query operand.
fn parse_segments(pairs: Pairs<'_, Rule>) -> Result<Vec<Segment>, ParseError> {
    let mut segments = Vec::new();
    for pair in pairs {
        match pair.as_rule() {
            Rule::root | Rule::EOI => {}
            Rule::child => segments.push(parse_member(first_inner(pair)?)?),
            Rule::descendant => {
                segments.push(Segment::RecursiveDescent);
                segments.push(parse_member(first_inner(pair)?)?);
            }
            Rule::bracket => {
                segments.push(parse_selector(first_inner(pair)?)?);
            }
            _ => return Err(unexpected_rule("segment", &pair)),
        }
    }
    Ok(segments)
}

/// Parse what follows `.` or `..`.
fn parse_member(pair: Pair<'_, Rule>) -> Result<Segment, ParseError> {
    match pair.as_rule() {
        Rule::wildcard => Ok(Segment::Wildcard),
        Rule::field_name => {
            let name = pair.as_str();
            if is_plain_field(name) {
                Ok(Segment::field(name))
            } else {
                Err(ParseError::InvalidFieldName(name.to_string()))
            }
        }
        Rule::bracket => parse_selector(first_inner(pair)?),
        _ => Err(unexpected_rule("field name or `*`", &pair)),
    }
}

/// Parse the contents of a bracket.
fn parse_selector(pair: Pair<'_, Rule>) -> Result<Segment, ParseError> {
    match pair.as_rule() {
        Rule::wildcard => Ok(Segment::Wildcard),
        Rule::index => Ok(Segment::Index(parse_int(&first_inner(pair)?)?)),
        Rule::name => Ok(Segment::Field(parse_string(first_inner(pair)?)?)),
        Rule::slice => parse_slice(pair),
        Rule::union_list => {
            let members = pair
                .into_inner()
                .map(|member| match member.as_rule() {
                    Rule::name => {
                        Ok(UnionMember::Field(parse_string(first_inner(member)?)?))
                    }
                    Rule::index => {
                        Ok(UnionMember::Index(parse_int(&first_inner(member)?)?))
                    }
                    _ => Err(unexpected_rule("name or index", &member)),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Segment::Union(members))
        }
        Rule::filter => {
            let predicate = parse_or(first_inner(pair)?)?;
            Ok(Segment::Filter(Box::new(predicate)))
        }
        _ => Err(unexpected_rule("selector", &pair)),
    }
}

/// Parse an integer rule into an `i64`.
fn parse_int(pair: &Pair<'_, Rule>) -> Result<i64, ParseError> {
    pair.as_str().parse::<i64>().map_err(|_| {
        ParseError::UnexpectedToken(format!(
            "integer out of range: {}",
            pair.as_str()
        ))
    })
}

/// Parse a slice rule into a [`Segment::Slice`], rejecting a zero step.
fn parse_slice(pair: Pair<'_, Rule>) -> Result<Segment, ParseError> {
    let (mut start, mut end, mut step) = (None, None, None);
    for part in pair.into_inner() {
        let rule = part.as_rule();
        let value = parse_int(&first_inner(part)?)?;
        match rule {
            Rule::slice_start => start = Some(value),
            Rule::slice_end => end = Some(value),
            Rule::slice_step => step = Some(value),
            _ => {
                return Err(ParseError::UnexpectedToken(format!(
                    "Unexpected slice part {rule:?}"
                )));
            }
        }
    }
    if step == Some(0) {
        return Err(ParseError::EmptyStep);
    }
    Ok(Segment::Slice { start, end, step })
}

/// Parse a string rule (either quote style) into its decoded contents.
fn parse_string(pair: Pair<'_, Rule>) -> Result<String, ParseError> {
    let raw = pair.into_inner().next().map_or("", |chars| chars.as_str());
    unescape(raw)
}

/// Decode the escape sequences of a quoted string literal.
fn unescape(raw: &str) -> Result<String, ParseError> {
    let mut result = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        let decoded = match chars.next() {
            Some('"') => '"',
            Some('\'') => '\'',
            Some('\\') => '\\',
            Some('/') => '/',
            Some('b') => '\u{8}',
            Some('f') => '\u{c}',
            Some('n') => '\n',
            Some('r') => '\r',
            Some('t') => '\t',
            Some('u') => {
                let high = read_hex4(&mut chars)?;
                let code = if (0xD800..0xDC00).contains(&high) {
                    if chars.next() != Some('\\') || chars.next() != Some('u') {
                        return Err(ParseError::UnexpectedToken(
                            "unpaired surrogate in string literal".to_string(),
                        ));
                    }
                    let low = read_hex4(&mut chars)?;
                    if !(0xDC00..0xE000).contains(&low) {
                        return Err(ParseError::UnexpectedToken(
                            "unpaired surrogate in string literal".to_string(),
                        ));
                    }
                    0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
                } else {
                    high
                };
                char::from_u32(code).ok_or_else(|| {
                    ParseError::UnexpectedToken(format!(
                        "invalid unicode escape \\u{code:04x}"
                    ))
                })?
            }
            other => {
                return Err(ParseError::UnexpectedToken(format!(
                    "invalid escape sequence `\\{}`",
                    other.map(String::from).unwrap_or_default()
                )));
            }
        };
        result.push(decoded);
    }
    Ok(result)
}

fn read_hex4(chars: &mut std::str::Chars<'_>) -> Result<u32, ParseError> {
    let digits: String = chars.by_ref().take(4).collect();
    if digits.len() != 4 {
        return Err(ParseError::UnexpectedToken(format!(
            "truncated unicode escape \\u{digits}"
        )));
    }
    u32::from_str_radix(&digits, 16).map_err(|_| {
        ParseError::UnexpectedToken(format!("invalid unicode escape \\u{digits}"))
    })
}

/// Parse a `logical_or` rule; `||` is left-associative.
fn parse_or(pair: Pair<'_, Rule>) -> Result<Predicate, ParseError> {
    let mut inner = pair.into_inner();
    let first = inner.next().ok_or_else(|| {
        ParseError::UnexpectedToken("empty filter".to_string())
    })?;
    inner.try_fold(parse_and(first)?, |lhs, rhs| {
        Ok(Predicate::Or(Box::new(lhs), Box::new(parse_and(rhs)?)))
    })
}

/// Parse a `logical_and` rule; `&&` is left-associative.
fn parse_and(pair: Pair<'_, Rule>) -> Result<Predicate, ParseError> {
    let mut inner = pair.into_inner();
    let first = inner.next().ok_or_else(|| {
        ParseError::UnexpectedToken("empty filter".to_string())
    })?;
    inner.try_fold(parse_unary(first)?, |lhs, rhs| {
        Ok(Predicate::And(Box::new(lhs), Box::new(parse_unary(rhs)?)))
    })
}

fn parse_unary(pair: Pair<'_, Rule>) -> Result<Predicate, ParseError> {
    match pair.as_rule() {
        Rule::negation => {
            Ok(Predicate::Not(Box::new(parse_unary(first_inner(pair)?)?)))
        }
        Rule::group => parse_or(first_inner(pair)?),
        Rule::comparison => parse_comparison(pair),
        Rule::existence => Ok(Predicate::Exists(parse_operand(first_inner(pair)?)?)),
        _ => Err(unexpected_rule("predicate", &pair)),
    }
}

fn parse_comparison(pair: Pair<'_, Rule>) -> Result<Predicate, ParseError> {
    let mut inner = pair.into_inner();
    let (Some(lhs), Some(op), Some(rhs)) = (inner.next(), inner.next(), inner.next())
    else {
        return Err(ParseError::UnexpectedToken(
            "incomplete comparison".to_string(),
        ));
    };
    let lhs = parse_operand(lhs)?;

    let op = match op.as_str() {
        "=~" => {
            let pattern = match rhs.as_rule() {
                Rule::regex => {
                    let mut parts = rhs.into_inner();
                    let body = parts.next().map_or("", |p| p.as_str());
                    let flags = parts.next().map_or("", |p| p.as_str());
                    Pattern::new(&body.replace("\\/", "/"), flags)?
                }
                Rule::string => Pattern::new(&parse_string(rhs)?, "")?,
                _ => {
                    return Err(ParseError::UnexpectedToken(format!(
                        "`=~` expects a regex or string pattern, got `{}`",
                        rhs.as_str()
                    )));
                }
            };
            return Ok(Predicate::Match(lhs, pattern));
        }
        "==" => CmpOp::Eq,
        "!=" => CmpOp::Ne,
        "<" => CmpOp::Lt,
        "<=" => CmpOp::Le,
        ">" => CmpOp::Gt,
        ">=" => CmpOp::Ge,
        other => {
            return Err(ParseError::UnexpectedToken(format!(
                "Unknown operator: {other}"
            )));
        }
    };

    if rhs.as_rule() == Rule::regex {
        return Err(ParseError::UnexpectedToken(format!(
            "regex literal `{}` requires `=~`",
            rhs.as_str()
        )));
    }
    Ok(Predicate::Compare(lhs, op, parse_operand(rhs)?))
}

fn parse_operand(pair: Pair<'_, Rule>) -> Result<Operand, ParseError> {
    let literal = match pair.as_rule() {
        Rule::current_query => {
            return Ok(Operand::Current(parse_segments(pair.into_inner())?));
        }
        Rule::root_query => {
            return Ok(Operand::Root(parse_segments(pair.into_inner())?));
        }
        Rule::number => {
            let n = pair.as_str().parse::<f64>().map_err(|_| {
                ParseError::UnexpectedToken(pair.as_str().to_string())
            })?;
            Literal::Number(n)
        }
        Rule::string => Literal::String(parse_string(pair)?),
        Rule::true_lit => Literal::Bool(true),
        Rule::false_lit => Literal::Bool(false),
        Rule::null_lit => Literal::Null,
        _ => return Err(unexpected_rule("operand", &pair)),
    };
    Ok(Operand::Literal(literal))
}
