//! Source locations attached to tokens, syntax nodes and diagnostics.
//!
//! Line 0 never occurs in real source, so a default span marks a node the
//! lowering pass generated. Such spans are skipped when rendering and lose
//! against real spans when merged.

use serde::Serialize;

/// A point in a source file. Lines and columns count from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    /// Byte offset from the start of the file
    pub offset: usize,
}

impl Position {
    pub fn new(line: u32, column: u32, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
    /// Index into the `SourceCache` the span was lexed from
    pub file_id: u32,
}

impl Span {
    pub fn new(start: Position, end: Position, file_id: u32) -> Self {
        Self {
            start,
            end,
            file_id,
        }
    }

    /// Zero-width span at `pos`
    pub fn point(pos: Position, file_id: u32) -> Self {
        Self::new(pos, pos, file_id)
    }

    /// Smallest span covering both. A synthetic side is ignored.
    pub fn merge(self, other: Span) -> Span {
        match (self.is_synthetic(), other.is_synthetic()) {
            (true, _) => other,
            (_, true) => self,
            _ => Span {
                start: std::cmp::min_by_key(self.start, other.start, |p| p.offset),
                end: std::cmp::max_by_key(self.end, other.end, |p| p.offset),
                file_id: self.file_id,
            },
        }
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.end.offset.saturating_sub(self.start.offset)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_synthetic(&self) -> bool {
        self.start.line == 0
    }
}

/// Syntax nodes and errors that know where they came from
pub trait Spanned {
    fn span(&self) -> Span;
}
