//! Verilog `$readmemh` memory image text.
//!
//! ```text
//! /* comment lines start with a slash-star
//! @00000000 67452301 efcdab89
//! 00 11 22 33
//! @00000100 deadbeef
//! ```
//!
//! An `@offset` line opens a segment at that byte address. Words on the same
//! line and on following lines are appended to it until the next `@offset`.

use std::fmt;
use std::io::{BufRead, Write};
use std::str::FromStr;

use tracing::{debug, trace};

use super::FormatError;
use crate::{Error, Segment};

/// How the address on each emitted line advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressStep {
    /// One address per word, as `$readmemh` indexes memory.
    #[default]
    Word,
    /// Byte addresses; each line advances by the word width.
    Byte,
}

impl FromStr for AddressStep {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "word" => Ok(AddressStep::Word),
            "byte" => Ok(AddressStep::Byte),
            other => Err(format!("unknown address step {other:?} (expected word or byte)")),
        }
    }
}

impl fmt::Display for AddressStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressStep::Word => f.write_str("word"),
            AddressStep::Byte => f.write_str("byte"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordFormat {
    /// Bytes per emitted word.
    pub width: usize,
    pub step: AddressStep,
}

impl Default for WordFormat {
    fn default() -> Self {
        Self {
            width: 4,
            step: AddressStep::Word,
        }
    }
}

impl WordFormat {
    pub fn with_width(width: usize) -> Self {
        Self {
            width,
            ..Self::default()
        }
    }
}

enum Line<'a> {
    Blank,
    Comment,
    Offset { offset: &'a str, rest: &'a str },
    /// `@` not directly followed by hex digits; carries the text up to the
    /// first whitespace.
    BadOffset(&'a str),
    Data(&'a str),
}

fn classify(line: &str) -> Line<'_> {
    let trimmed = line.trim_start();
    if trimmed.trim_end().is_empty() {
        return Line::Blank;
    }
    if trimmed.starts_with("/*") {
        return Line::Comment;
    }
    if let Some(body) = trimmed.strip_prefix('@') {
        let split = body
            .find(|c: char| !c.is_ascii_hexdigit())
            .unwrap_or(body.len());
        let (offset, rest) = body.split_at(split);
        if offset.is_empty() {
            let token = body.split(char::is_whitespace).next().unwrap_or("");
            return Line::BadOffset(token);
        }
        return Line::Offset { offset, rest };
    }
    Line::Data(line)
}

/// Parse memory image text into segments, in file order.
///
/// Segments are only returned once the whole input has been read; any error
/// discards everything parsed so far.
pub fn read_vmem<R: BufRead>(reader: R) -> Result<Vec<Segment>, Error> {
    let mut segments = Vec::new();
    let mut current: Option<Segment> = None;

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line?;

        match classify(&line) {
            Line::Blank | Line::Comment => continue,
            Line::Offset { offset, rest } => {
                let mut segment =
                    Segment::with_hex_offset(offset).map_err(|e| e.at_line(line_no))?;
                debug!(
                    "line {line_no}: new segment at {:#010x}",
                    segment.base_address()
                );
                segment
                    .append_text_line(rest)
                    .map_err(|e| e.at_line(line_no))?;
                if let Some(done) = current.replace(segment) {
                    segments.push(done);
                }
            }
            Line::BadOffset(token) => {
                return Err(FormatError::InvalidOffset {
                    line: line_no,
                    offset: token.to_string(),
                }
                .into());
            }
            Line::Data(text) => {
                let segment = current
                    .as_mut()
                    .ok_or(FormatError::NoOpenSegment { line: line_no })?;
                trace!("line {line_no}: continuation {text:?}");
                segment
                    .append_text_line(text)
                    .map_err(|e| e.at_line(line_no))?;
            }
        }
    }

    segments.push(current.ok_or(FormatError::NoSegment)?);
    debug!("parsed {} segment(s)", segments.len());
    Ok(segments)
}

/// Write segments as memory image text, one addressed word per line.
pub fn write_vmem<W: Write>(
    segments: &[Segment],
    out: &mut W,
    format: &WordFormat,
) -> Result<(), Error> {
    for segment in segments {
        for line in segment.to_text_words(format)? {
            writeln!(out, "{line}")?;
        }
    }
    out.flush()?;
    Ok(())
}
