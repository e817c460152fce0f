//! Document loading and output helpers for the `jps` binary.

use anyhow::Context as _;
use colored::Colorize;
use memmap2::Mmap;
use std::fs::File;
use std::io::{self, ErrorKind, Read, Write};
use std::ops::Deref;
use std::path::Path;

use crate::query::MatchSet;
use crate::query::render::write_matches;

// ==============================================================================
// Documents
// ==============================================================================

/// The bytes of a JSON document, either mapped from a file or read into
/// memory.
#[derive(Debug)]
pub enum Document {
    /// A memory-mapped file.
    Mapped(Mmap),
    /// Bytes read from a stream (or an empty file, which cannot be mapped).
    Owned(Vec<u8>),
}

impl Document {
    /// Map the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or mapped.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let len = file
            .metadata()
            .with_context(|| format!("Failed to stat {}", path.display()))?
            .len();
        if len == 0 {
            return Ok(Self::Owned(Vec::new()));
        }
        // SAFETY: the map is read-only and lives only for this process. If
        // another process truncates the file while it is mapped, reads may
        // fault; that is the usual contract of mapping user files.
        let map = unsafe { Mmap::map(&file) }
            .with_context(|| format!("Failed to map {}", path.display()))?;
        log::debug!("mapped {} ({len} bytes)", path.display());
        Ok(Self::Mapped(map))
    }

    /// Read a whole document from `reader`.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails.
    pub fn from_reader<R: Read>(mut reader: R) -> anyhow::Result<Self> {
        let mut buffer = Vec::new();
        reader
            .read_to_end(&mut buffer)
            .context("Failed to read input")?;
        Ok(Self::Owned(buffer))
    }
}

impl Deref for Document {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Self::Mapped(map) => map,
            Self::Owned(bytes) => bytes,
        }
    }
}

// ==============================================================================
// Output
// ==============================================================================

/// Run `write` and treat a broken pipe as success, so that piping to tools
/// like `head` exits cleanly.
///
/// # Errors
///
/// Returns any other error from `write`.
pub fn tolerate_broken_pipe(
    write: impl FnOnce() -> io::Result<()>,
) -> anyhow::Result<()> {
    match write() {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::BrokenPipe => Ok(()),
        Err(err) => Err(err).context("write to stdout"),
    }
}

/// Write the rendered matches followed by a newline. Nothing at all is
/// written for an empty set. With `color`, the JSON is syntax highlighted.
///
/// # Errors
///
/// Returns an error if writing to `writer` fails.
pub fn write_result<W: Write>(
    writer: &mut W,
    input: &[u8],
    matches: &MatchSet,
    color: bool,
) -> anyhow::Result<()> {
    if matches.is_empty() {
        return Ok(());
    }
    tolerate_broken_pipe(|| {
        if color {
            let mut rendered = Vec::new();
            write_matches(&mut rendered, input, matches)?;
            write_colored_json(writer, &rendered)?;
        } else {
            write_matches(writer, input, matches)?;
        }
        writeln!(writer)
    })
}

/// Write the match spans as a JSON array of `{"start": _, "end": _}`.
///
/// # Errors
///
/// Returns an error if writing to `writer` fails.
pub fn write_spans<W: Write>(
    writer: &mut W,
    matches: &MatchSet,
) -> anyhow::Result<()> {
    let spans = serde_json::to_string(matches.spans())
        .context("serialize match spans")?;
    tolerate_broken_pipe(|| writeln!(writer, "{spans}"))
}

/// Write raw JSON bytes with syntax highlighting. The bytes are copied
/// through unchanged apart from the colour codes; nothing is reformatted.
///
/// # Errors
///
/// Returns any error from `writer`.
pub fn write_colored_json<W: Write>(writer: &mut W, json: &[u8]) -> io::Result<()> {
    let mut pos = 0;
    while pos < json.len() {
        let end = token_end(json, pos);
        let token = String::from_utf8_lossy(&json[pos..end]);
        match json[pos] {
            b'"' if is_key(json, end) => write!(writer, "{}", token.cyan())?,
            b'"' => write!(writer, "{}", token.green())?,
            b'-' | b'0'..=b'9' => write!(writer, "{}", token.yellow())?,
            b't' | b'f' => write!(writer, "{}", token.yellow().bold())?,
            b'n' => write!(writer, "{}", token.red().dimmed())?,
            _ => writer.write_all(&json[pos..end])?,
        }
        pos = end;
    }
    Ok(())
}

/// End of the token starting at `start`: a whole string, a run of scalar
/// characters, or a single other byte.
fn token_end(json: &[u8], start: usize) -> usize {
    match json[start] {
        b'"' => {
            let mut escaped = false;
            for (offset, &byte) in json[start + 1..].iter().enumerate() {
                match byte {
                    _ if escaped => escaped = false,
                    b'\\' => escaped = true,
                    b'"' => return start + offset + 2,
                    _ => {}
                }
            }
            json.len()
        }
        byte if is_scalar_byte(byte) => json[start..]
            .iter()
            .position(|&b| !is_scalar_byte(b))
            .map_or(json.len(), |len| start + len),
        _ => start + 1,
    }
}

const fn is_scalar_byte(byte: u8) -> bool {
    matches!(byte, b'-' | b'+' | b'.' | b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z')
}

/// Whether the string ending at `end` is an object key.
fn is_key(json: &[u8], end: usize) -> bool {
    json[end..]
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|&b| b == b':')
}
