//! Source text and location tracking.
//!
//! Every parser wraps its input in a [`SourceFile`] once, then stamps nodes
//! and diagnostics with byte-offset [`Span`]s into it. Line and column numbers
//! are derived on demand from precomputed line starts.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Immutable source text plus an optional origin label (usually a file path).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    content: String,
    origin: Option<String>,
    /// Byte offset of the first character of every line. Always starts with 0.
    line_starts: Vec<usize>,
}

impl SourceFile {
    pub fn new(content: impl Into<String>, origin: Option<&str>) -> Self {
        let content = content.into();
        let mut line_starts = vec![0];
        line_starts.extend(
            content
                .bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            content,
            origin: origin.map(str::to_string),
            line_starts,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Number of lines, counting a trailing partial line.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Resolve a byte offset to a 1-based line and column.
    ///
    /// Offsets past the end clamp to the end of the source. The column counts
    /// characters, not bytes.
    pub fn location(&self, offset: usize) -> Location {
        let offset = offset.min(self.content.len());
        let line_idx = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let line_start = self.line_starts[line_idx];
        let column = self
            .content
            .get(line_start..offset)
            .map_or(offset - line_start, |prefix| prefix.chars().count());
        Location {
            line: line_idx + 1,
            column: column + 1,
        }
    }

    /// Source text covered by `span`, or `""` if the span is out of range.
    pub fn slice(&self, span: Span) -> &str {
        self.content.get(span.start_offset..span.end_offset).unwrap_or("")
    }

    /// Span covering the whole source.
    pub fn full_span(&self) -> Span {
        Span::new(0, self.content.len())
    }
}

/// A half-open byte range `[start_offset, end_offset)` into a [`SourceFile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    pub start_offset: usize,
    pub end_offset: usize,
}

impl Span {
    pub const fn new(start_offset: usize, end_offset: usize) -> Self {
        Self {
            start_offset,
            end_offset,
        }
    }

    pub const fn len(&self) -> usize {
        self.end_offset.saturating_sub(self.start_offset)
    }

    pub const fn is_empty(&self) -> bool {
        self.start_offset >= self.end_offset
    }

    /// Smallest span covering both.
    pub fn merge(self, other: Span) -> Span {
        Span {
            start_offset: self.start_offset.min(other.start_offset),
            end_offset: self.end_offset.max(other.end_offset),
        }
    }
}

/// 1-based line and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
