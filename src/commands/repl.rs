/*!
`repl` subcommand: a live query loop over one loaded document.

Each input line is a path. The loop prints the rendered result, `(no match)`
when nothing matched, or the error. Parsed paths are cached by their exact
text for as long as the loop runs, since the document never changes.

```
use jpslice::commands::repl::Repl;

let doc = br#"{"x": [{"id": "A"}, {"id": "B"}]}"#;
let mut output = Vec::new();
Repl::new(doc)
    .run("$.x[1].id\n$.y\n".as_bytes(), &mut output)
    .unwrap();
assert_eq!(String::from_utf8(output).unwrap(), "\"B\"\n(no match)\n");
```
*/
use anyhow::{Context, Result};
use colored::Colorize;
use std::collections::HashMap;
use std::io::{BufRead, Write};

use crate::Error;
use crate::query::{JsonPath, render};

/// Query loop state: the document and the paths parsed so far.
#[derive(Debug)]
pub struct Repl<'a> {
    document: &'a [u8],
    cache: HashMap<String, JsonPath>,
    prompt: bool,
}

impl<'a> Repl<'a> {
    /// Create a loop over `document`.
    #[must_use]
    pub fn new(document: &'a [u8]) -> Self {
        Self {
            document,
            cache: HashMap::new(),
            prompt: false,
        }
    }

    /// Print a `> ` prompt before reading each line.
    #[must_use]
    pub const fn with_prompt(mut self, prompt: bool) -> Self {
        self.prompt = prompt;
        self
    }

    /// Number of distinct paths parsed so far.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Evaluate one query against the document.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if the query does not parse or the document is
    /// malformed where it was scanned.
    pub fn eval(&mut self, query: &str) -> Result<Vec<u8>, Error> {
        if !self.cache.contains_key(query) {
            let path = JsonPath::parse(query)?;
            self.cache.insert(query.to_string(), path);
        }
        let path = &self.cache[query];
        let matches = path.select(self.document)?;
        Ok(render::render(self.document, &matches))
    }

    /// Read queries from `input` until it ends, writing one result per
    /// non-blank line to `output`.
    ///
    /// # Errors
    ///
    /// Returns an error only if reading or writing fails; query errors are
    /// printed and the loop continues.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, output: &mut W) -> Result<()> {
        let mut lines = input.lines();
        loop {
            if self.prompt {
                write!(output, "> ")?;
                output.flush()?;
            }
            let Some(line) = lines.next() else {
                break;
            };
            let line = line.context("Failed to read query")?;
            let query = line.trim();
            if query.is_empty() {
                continue;
            }
            match self.eval(query) {
                Ok(bytes) if bytes.is_empty() => {
                    writeln!(output, "{}", "(no match)".dimmed())?;
                }
                Ok(bytes) => {
                    output.write_all(&bytes)?;
                    writeln!(output)?;
                }
                Err(err) => {
                    log::debug!("query {query:?} failed: {err:?}");
                    writeln!(output, "{} {err}", "error:".red().bold())?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::lexer::EvalError;
    use crate::query::ParseError;

    const DOC: &[u8] = br#"{"x": [{"id": "A", "n": 1}, {"id": "B", "n": 2}]}"#;

    fn run(doc: &[u8], input: &str) -> String {
        colored::control::set_override(false);
        let mut output = Vec::new();
        Repl::new(doc).run(input.as_bytes(), &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn evaluates_each_line() {
        let output = run(DOC, "$.x[0].id\n\n  $.x[*].n  \n$.missing\n");
        assert_eq!(output, "\"A\"\n[1,2]\n(no match)\n");
    }

    #[test]
    fn errors_do_not_stop_the_loop() {
        let output = run(DOC, "$.x[\n$.x[-1].id\n");
        assert_eq!(
            output,
            format!(
                "error: {}\n\"B\"\n",
                Error::Parse(ParseError::UnterminatedBracket(3))
            )
        );
    }

    #[test]
    fn malformed_document_is_reported_per_query() {
        let output = run(br#"{"a": [1, 2}"#, "$.a\n");
        assert!(output.starts_with("error: "));
        assert!(output.contains(&EvalError::InvalidByte { offset: 11, byte: b'}' }.to_string()));
    }

    #[test]
    fn parsed_paths_are_cached() {
        let mut repl = Repl::new(DOC);
        assert_eq!(repl.eval("$.x[0].n").unwrap(), b"1");
        assert_eq!(repl.eval("$.x[0].n").unwrap(), b"1");
        assert_eq!(repl.eval("$.x[1].n").unwrap(), b"2");
        assert!(repl.eval("$[").is_err());
        assert_eq!(repl.cached(), 2);
    }

    #[test]
    fn prompt_is_written_per_read() {
        colored::control::set_override(false);
        let mut output = Vec::new();
        Repl::new(DOC)
            .with_prompt(true)
            .run("$.x[0].n\n".as_bytes(), &mut output)
            .unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "> 1\n> ");
    }
}
