//! Line-addressable view of the original template text.
//!
//! This is the only module that understands raw text offsets. Everything
//! else in the crate addresses the source exclusively through [`Span`]s
//! attached to nodes, which keeps the reprinter honest: region boundaries
//! are always derived from node locations, never from fixed offsets.

use serde::{Deserialize, Serialize};

/// A point in the source text: 1-indexed line, 0-indexed byte column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// A half-open region of the source text: `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// A zero-width span anchored at a single position.
    ///
    /// Used for constructs that are present in the tree but occupy no text,
    /// such as an empty block body or an empty hash.
    pub fn collapsed(at: Position) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Source text split into lines that retain their original terminators.
///
/// Resolving a [`Span`] against the index returns the exact original
/// substring, byte for byte, including any interior newlines.
#[derive(Debug, Clone)]
pub struct SourceIndex {
    lines: Vec<String>,
}

impl SourceIndex {
    pub fn new(source: &str) -> Self {
        Self {
            lines: source.split_inclusive('\n').map(str::to_string).collect(),
        }
    }

    /// Number of lines, counting a trailing unterminated line.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// The exact substring covered by `span`.
    ///
    /// Columns beyond the end of a line clamp to the line length, and lines
    /// beyond the end of the text contribute nothing; a span that is fully
    /// out of range yields the empty string.
    pub fn slice(&self, span: Span) -> String {
        let Span { start, end } = span;
        if start.line == 0 || start.line > self.lines.len() {
            return String::new();
        }
        if end < start {
            return String::new();
        }

        if start.line == end.line {
            let line = &self.lines[start.line - 1];
            let from = start.column.min(line.len());
            let to = end.column.min(line.len());
            return line[from..to.max(from)].to_string();
        }

        let mut out = String::new();
        let first = &self.lines[start.line - 1];
        out.push_str(&first[start.column.min(first.len())..]);

        for line_no in (start.line + 1)..end.line {
            if let Some(line) = self.lines.get(line_no - 1) {
                out.push_str(line);
            }
        }

        if let Some(last) = self.lines.get(end.line - 1) {
            out.push_str(&last[..end.column.min(last.len())]);
        }
        out
    }

    /// The text lying strictly between two positions.
    pub fn between(&self, from: Position, to: Position) -> String {
        self.slice(Span::new(from, to))
    }
}
