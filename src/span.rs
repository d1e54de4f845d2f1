//! Source positions and spans.
//!
//! Tokens and AST nodes carry a `Span` so diagnostics and dumps can point
//! back into the original text.

use std::fmt;

/// A point in the source: 1-based line and column plus a byte offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub const START: Position = Position {
        offset: 0,
        line: 1,
        column: 1,
    };
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Half-open source range: `end` is the position just past the last character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn empty(at: Position) -> Self {
        Self { start: at, end: at }
    }

    pub fn contains(&self, other: &Span) -> bool {
        self.start.offset <= other.start.offset && other.end.offset <= self.end.offset
    }

    /// True when `self` ends at or before `other` starts
    pub fn precedes(&self, other: &Span) -> bool {
        self.end.offset <= other.start.offset
    }

    pub fn len(&self) -> usize {
        self.end.offset - self.start.offset
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(offset: usize, line: usize, column: usize) -> Position {
        Position {
            offset,
            line,
            column,
        }
    }

    #[test]
    fn test_containment_and_order() {
        let outer = Span::new(pos(0, 1, 1), pos(20, 2, 5));
        let first = Span::new(pos(2, 1, 3), pos(6, 1, 7));
        let second = Span::new(pos(6, 1, 7), pos(10, 1, 11));

        assert!(outer.contains(&first));
        assert!(outer.contains(&second));
        assert!(!first.contains(&outer));
        assert!(first.precedes(&second));
        assert!(!second.precedes(&first));
    }

    #[test]
    fn test_display() {
        let span = Span::new(pos(0, 1, 1), pos(12, 1, 13));
        assert_eq!(span.to_string(), "1:1-1:13");
        assert_eq!(span.len(), 12);
        assert!(Span::empty(Position::START).is_empty());
    }
}
