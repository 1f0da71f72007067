//! Source position, byte range, and location types.
//!
//! Lines are 1-based, columns are 0-based, and byte ranges are 0-based and
//! half-open (`from..to`). These three types are the only way any token or
//! AST node refers back to the source buffer.

use std::fmt;

/// A line/column position. Lines start at 1, columns start at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    pub fn start() -> Self {
        Self { line: 1, column: 0 }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A half-open byte range into the source buffer: `from <= to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Range {
    pub from: usize,
    pub to: usize,
}

impl Range {
    pub fn new(from: usize, to: usize) -> Self {
        debug_assert!(to >= from, "range end must not precede its start");
        Self { from, to }
    }

    pub fn len(&self) -> usize {
        self.to - self.from
    }

    pub fn is_empty(&self) -> bool {
        self.to == self.from
    }

    /// The smallest range spanning both `self` and `other`.
    pub fn join(&self, other: &Range) -> Range {
        Range::new(self.from.min(other.from), self.to.max(other.to))
    }
}

/// A start/end pair of positions spanning a token or node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
    pub start: Position,
    pub end: Position,
}

impl Location {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// The smallest location spanning both `self` and `other`, per
    /// invariant 2 in the data model: a parent's location must span all of
    /// its children's locations.
    pub fn join(&self, other: &Location) -> Location {
        let start = if self.start <= other.start {
            self.start
        } else {
            other.start
        };
        let end = if self.end >= other.end {
            self.end
        } else {
            other.end
        };
        Location::new(start, end)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
