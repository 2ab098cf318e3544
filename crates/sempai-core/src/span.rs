//! Source positions reported by the structural-matching backend.

use serde::{Deserialize, Serialize};

/// A line and column pair as presented to users.
///
/// Both fields are one-indexed, matching the backend's output.
///
/// # Example
///
/// ```
/// use sempai_core::LineCol;
///
/// let pos = LineCol::new(10, 4);
/// assert_eq!(pos.line(), 10);
/// assert_eq!(pos.col(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineCol {
    /// One-indexed line number.
    pub line: u32,
    /// One-indexed column number.
    pub col: u32,
}

impl LineCol {
    /// Creates a new line/column pair.
    #[must_use]
    pub const fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }

    /// Returns the line number.
    #[must_use]
    pub const fn line(&self) -> u32 {
        self.line
    }

    /// Returns the column number.
    #[must_use]
    pub const fn col(&self) -> u32 {
        self.col
    }
}

/// A full backend position: line, column, and byte offset.
///
/// The offset is what the evaluator compares; line and column are kept
/// for presentation and deduplication.
///
/// # Example
///
/// ```
/// use sempai_core::Position;
///
/// let pos = Position::new(3, 5, 42);
/// assert_eq!(pos.offset(), 42);
/// assert_eq!(pos.line_col().line(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// One-indexed line number.
    pub line: u32,
    /// One-indexed column number.
    pub col: u32,
    /// Zero-indexed byte offset from the start of the file.
    pub offset: u32,
}

impl Position {
    /// Creates a new position.
    #[must_use]
    pub const fn new(line: u32, col: u32, offset: u32) -> Self {
        Self { line, col, offset }
    }

    /// Returns the byte offset.
    #[must_use]
    pub const fn offset(&self) -> u32 {
        self.offset
    }

    /// Returns the position without its byte offset.
    #[must_use]
    pub const fn line_col(&self) -> LineCol {
        LineCol::new(self.line, self.col)
    }
}

/// The start and end positions of one backend match.
///
/// The byte range is half-open: `start.offset` is inclusive and
/// `end.offset` is exclusive.
///
/// # Example
///
/// ```
/// use sempai_core::{Position, Span};
///
/// let span = Span::new(Position::new(1, 1, 0), Position::new(1, 11, 10));
/// assert_eq!(span.start().offset(), 0);
/// assert_eq!(span.end().offset(), 10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Start position (inclusive).
    pub start: Position,
    /// End position (exclusive).
    pub end: Position,
}

impl Span {
    /// Creates a new span.
    #[must_use]
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Returns the start position.
    #[must_use]
    pub const fn start(&self) -> &Position {
        &self.start
    }

    /// Returns the end position.
    #[must_use]
    pub const fn end(&self) -> &Position {
        &self.end
    }
}
