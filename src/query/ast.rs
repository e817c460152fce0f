/*!
# Path AST and Builder

Defines the parsed form of a JSONPath query: an ordered list of [`Segment`]s,
with [`Predicate`] trees for filter segments. Also exposes a fluent API for
constructing paths with [`PathBuilder`].

# Examples

A path can be parsed from a raw string:

```
use jpslice::query::{JsonPath, Segment};
let path: JsonPath = "$.foo[0]".parse().expect("Invalid path");
assert_eq!(path.segments(), &[Segment::field("foo"), Segment::Index(0)]);
```

Or built with the [`PathBuilder`]:

```
use jpslice::query::{JsonPath, PathBuilder};
let path = PathBuilder::new().field("foo").index(0).build();
assert_eq!(path.to_string(), "$.foo[0]");
```
*/
use regex::{Regex, RegexBuilder};
use std::{fmt::Display, str::FromStr};

use super::{ParseError, parse_path};

/// One step of a parsed path.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Member access by exact name, e.g., `.foo` or `["foo"]`
    Field(String),
    /// All members of an object or all elements of an array, e.g., `[*]`
    Wildcard,
    /// Array element access; negative indices count from the end, e.g. `[-1]`
    Index(i64),
    /// Array slice `[start:end:step]`; every bound is optional
    Slice {
        /// First index (inclusive)
        start: Option<i64>,
        /// Last index (exclusive)
        end: Option<i64>,
        /// Stride; never zero once parsed
        step: Option<i64>,
    },
    /// Several indices and/or names applied independently, e.g. `[0,"a"]`
    Union(Vec<UnionMember>),
    /// `..`: the following segment applies at every depth, including the
    /// current node itself
    RecursiveDescent,
    /// Filter `[?(...)]` over the direct children of the current node
    Filter(Box<Predicate>),
}

impl Segment {
    /// Helper for ergonomic construction of field segments
    pub fn field<T: Into<String>>(name: T) -> Self {
        Self::Field(name.into())
    }
}

/// A member of a union selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnionMember {
    /// Member name
    Field(String),
    /// Array index
    Index(i64),
}

/// Boolean expression evaluated against one candidate child at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `lhs || rhs`
    Or(Box<Self>, Box<Self>),
    /// `lhs && rhs`
    And(Box<Self>, Box<Self>),
    /// `!inner`
    Not(Box<Self>),
    /// `lhs op rhs`
    Compare(Operand, CmpOp, Operand),
    /// `lhs =~ /pattern/`
    Match(Operand, Pattern),
    /// A bare query, true when it selects at least one value
    Exists(Operand),
}

/// One side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Path relative to the candidate, e.g. `@.price`
    Current(Vec<Segment>),
    /// Path relative to the document root, e.g. `$.limit`
    Root(Vec<Segment>),
    /// Constant value
    Literal(Literal),
}

/// Literal constants that can appear in a filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Any JSON number
    Number(f64),
    /// Decoded string
    String(String),
    /// `true` or `false`
    Bool(bool),
    /// `null`
    Null,
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl CmpOp {
    /// The operator as written in a query.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

impl Display for CmpOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compiled regular expression for `=~`, kept with its source so that
/// paths can be compared and displayed.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    flags: String,
    regex: Regex,
}

impl Pattern {
    /// Compile `source` with the given flags (`i`, `m`, `s`, `x`).
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidRegex`] for unknown flags or a pattern
    /// that fails to compile.
    pub fn new(source: &str, flags: &str) -> Result<Self, ParseError> {
        let mut builder = RegexBuilder::new(source);
        for flag in flags.chars() {
            match flag {
                'i' => builder.case_insensitive(true),
                'm' => builder.multi_line(true),
                's' => builder.dot_matches_new_line(true),
                'x' => builder.ignore_whitespace(true),
                other => {
                    return Err(ParseError::InvalidRegex(format!(
                        "unknown flag `{other}`"
                    )));
                }
            };
        }
        let regex = builder
            .build()
            .map_err(|e| ParseError::InvalidRegex(e.to_string()))?;
        Ok(Self {
            source: source.to_string(),
            flags: flags.to_string(),
            regex,
        })
    }

    /// Whether the pattern matches anywhere in `text`.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// The pattern source, without delimiters or flags.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.flags == other.flags
    }
}

impl Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "/{}/{}", self.source.replace('/', "\\/"), self.flags)
    }
}

/// A parsed JSONPath query: the root `$` followed by its segments.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JsonPath {
    segments: Vec<Segment>,
}

impl JsonPath {
    /// Parse a query string.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] describing how the parsing failed.
    pub fn parse(query: &str) -> Result<Self, ParseError> {
        parse_path(query)
    }

    /// The segments of the path, in evaluation order.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Whether the path can select at most one value: it contains only
    /// field and index segments.
    #[must_use]
    pub fn is_definite(&self) -> bool {
        self.segments
            .iter()
            .all(|s| matches!(s, Segment::Field(_) | Segment::Index(_)))
    }
}

impl From<Vec<Segment>> for JsonPath {
    fn from(segments: Vec<Segment>) -> Self {
        Self { segments }
    }
}

impl FromStr for JsonPath {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_path(s)
    }
}

impl Display for JsonPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "$")?;
        write_segments(f, &self.segments)
    }
}

/// Returns `true` if a field name can be written with dot notation, i.e. it
/// is non-empty and only uses `[A-Za-z0-9_]`.
pub(crate) fn is_plain_field(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Write a double-quoted string literal, escaping `"`, `\` and control
/// characters.
fn write_quoted(f: &mut std::fmt::Formatter<'_>, s: &str) -> std::fmt::Result {
    write!(f, "\"")?;
    for c in s.chars() {
        match c {
            '"' => write!(f, "\\\"")?,
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            '\r' => write!(f, "\\r")?,
            '\t' => write!(f, "\\t")?,
            c if c.is_control() => write!(f, "\\u{:04x}", u32::from(c))?,
            c => write!(f, "{c}")?,
        }
    }
    write!(f, "\"")
}

/// Write a segment list in canonical form. A segment right after `..` drops
/// its leading dot (`..name`, `..*`).
fn write_segments(
    f: &mut std::fmt::Formatter<'_>,
    segments: &[Segment],
) -> std::fmt::Result {
    let mut after_descent = false;
    for segment in segments {
        match segment {
            Segment::Field(name) if after_descent && is_plain_field(name) => {
                write!(f, "{name}")?;
            }
            Segment::Wildcard if after_descent => write!(f, "*")?,
            _ => write!(f, "{segment}")?,
        }
        after_descent = matches!(segment, Segment::RecursiveDescent);
    }
    Ok(())
}

impl Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Field(name) => {
                if is_plain_field(name) {
                    write!(f, ".{name}")
                } else {
                    write!(f, "[")?;
                    write_quoted(f, name)?;
                    write!(f, "]")
                }
            }
            Self::Wildcard => write!(f, "[*]"),
            Self::Index(idx) => write!(f, "[{idx}]"),
            Self::Slice { start, end, step } => {
                write!(f, "[")?;
                if let Some(s) = start {
                    write!(f, "{s}")?;
                }
                write!(f, ":")?;
                if let Some(e) = end {
                    write!(f, "{e}")?;
                }
                if let Some(st) = step {
                    write!(f, ":{st}")?;
                }
                write!(f, "]")
            }
            Self::Union(members) => {
                write!(f, "[")?;
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    match member {
                        UnionMember::Field(name) => write_quoted(f, name)?,
                        UnionMember::Index(idx) => write!(f, "{idx}")?,
                    }
                }
                write!(f, "]")
            }
            Self::RecursiveDescent => write!(f, ".."),
            Self::Filter(predicate) => write!(f, "[?({predicate})]"),
        }
    }
}

impl Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Or(lhs, rhs) => write!(f, "{lhs} || {rhs}"),
            Self::And(lhs, rhs) => {
                // `||` binds looser than `&&`, so nested ors need parentheses
                for (i, side) in [lhs, rhs].into_iter().enumerate() {
                    if i > 0 {
                        write!(f, " && ")?;
                    }
                    if matches!(**side, Self::Or(..)) {
                        write!(f, "({side})")?;
                    } else {
                        write!(f, "{side}")?;
                    }
                }
                Ok(())
            }
            Self::Not(inner) => match **inner {
                Self::Exists(_) | Self::Not(_) => write!(f, "!{inner}"),
                _ => write!(f, "!({inner})"),
            },
            Self::Compare(lhs, op, rhs) => write!(f, "{lhs} {op} {rhs}"),
            Self::Match(lhs, pattern) => write!(f, "{lhs} =~ {pattern}"),
            Self::Exists(operand) => write!(f, "{operand}"),
        }
    }
}

impl Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Current(segments) => {
                write!(f, "@")?;
                write_segments(f, segments)
            }
            Self::Root(segments) => {
                write!(f, "$")?;
                write_segments(f, segments)
            }
            Self::Literal(literal) => write!(f, "{literal}"),
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write_quoted(f, s),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Null => write!(f, "null"),
        }
    }
}

/// Builder for constructing paths
pub struct PathBuilder {
    /// The segments pushed so far
    segments: Vec<Segment>,
}

impl PathBuilder {
    /// Creates a new `PathBuilder` for the bare root path `$`.
    ///
    /// # Examples
    /// ```
    /// use jpslice::query::PathBuilder;
    /// let path = PathBuilder::new().build();
    /// assert!(path.segments().is_empty());
    /// ```
    #[must_use]
    pub const fn new() -> Self {
        Self { segments: vec![] }
    }

    /// Adds a member access.
    ///
    /// # Examples
    ///
    /// ```
    /// use jpslice::query::PathBuilder;
    /// let path = PathBuilder::new().field("foo").field("key-with-dash").build();
    /// assert_eq!(path.to_string(), r#"$.foo["key-with-dash"]"#);
    /// ```
    #[must_use]
    pub fn field(mut self, name: &str) -> Self {
        self.segments.push(Segment::field(name));
        self
    }

    /// Adds an index access.
    ///
    /// # Examples
    ///
    /// ```
    /// use jpslice::query::PathBuilder;
    /// let path = PathBuilder::new().index(-1).build();
    /// assert_eq!(path.to_string(), "$[-1]");
    /// ```
    #[must_use]
    pub fn index(mut self, idx: i64) -> Self {
        self.segments.push(Segment::Index(idx));
        self
    }

    /// Adds a slice.
    ///
    /// # Examples
    ///
    /// ```
    /// use jpslice::query::PathBuilder;
    /// let path = PathBuilder::new().slice(Some(1), None, Some(2)).build();
    /// assert_eq!(path.to_string(), "$[1::2]");
    /// ```
    #[must_use]
    pub fn slice(
        mut self,
        start: Option<i64>,
        end: Option<i64>,
        step: Option<i64>,
    ) -> Self {
        self.segments.push(Segment::Slice { start, end, step });
        self
    }

    /// Adds a wildcard over object members or array elements.
    #[must_use]
    pub fn wildcard(mut self) -> Self {
        self.segments.push(Segment::Wildcard);
        self
    }

    /// Adds a recursive descent; the next segment added applies at every
    /// depth.
    ///
    /// # Examples
    ///
    /// ```
    /// use jpslice::query::PathBuilder;
    /// let path = PathBuilder::new().descendant().field("name").build();
    /// assert_eq!(path.to_string(), "$..name");
    /// ```
    #[must_use]
    pub fn descendant(mut self) -> Self {
        self.segments.push(Segment::RecursiveDescent);
        self
    }

    /// Adds a union of names and indices.
    #[must_use]
    pub fn union(mut self, members: Vec<UnionMember>) -> Self {
        self.segments.push(Segment::Union(members));
        self
    }

    /// Adds a filter.
    #[must_use]
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.segments.push(Segment::Filter(Box::new(predicate)));
        self
    }

    /// Return the built path as [`JsonPath`].
    #[must_use]
    pub fn build(self) -> JsonPath {
        JsonPath::from(self.segments)
    }
}

impl Default for PathBuilder {
    fn default() -> Self {
        Self::new()
    }
}
