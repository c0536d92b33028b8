//! Source locations for tokens, syntax nodes and diagnostics.
//!
//! A [`Span`] is a half-open byte range into the source text. [`Spanned`]
//! attaches a span to any value, and [`LineIndex`] turns byte offsets into
//! zero-based `[row, column]` [`Point`]s for display.

use std::{fmt, ops::Range};

/// A half-open byte range `start..end` in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    start: usize,
    end: usize,
}

impl Span {
    /// Create a new span from a byte range.
    pub fn new(range: Range<usize>) -> Self {
        Self {
            start: range.start,
            end: range.end,
        }
    }

    /// Create an empty span at `offset`.
    pub fn empty(offset: usize) -> Self {
        Self::new(offset..offset)
    }

    /// Get the start offset of the span
    pub fn start(&self) -> usize {
        self.start
    }

    /// Get the end offset of the span
    pub fn end(&self) -> usize {
        self.end
    }

    /// Get the length of the span
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Check if the span is empty
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Create a union of two spans (encompassing both)
    pub fn union(&self, other: Span) -> Span {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// The byte range covered by this span.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Self::new(range)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A generic wrapper for syntax elements that tracks source position information.
///
/// `Spanned<T>` wraps any type `T` with location metadata, so later phases can
/// report diagnostics that point at the exact source text.
#[derive(Debug, Clone, Copy, Default)]
pub struct Spanned<T> {
    value: T,
    span: Span,
}

impl<T> Spanned<T> {
    /// Create a new spanned value from a value and span information
    pub fn new(value: T, span: Span) -> Self {
        Self { value, span }
    }

    pub fn span(&self) -> Span {
        self.span
    }

    /// Convert from one spanned type to another using the provided function
    ///
    /// This maintains the same span information while transforming the value.
    pub fn map<F, U>(&self, f: F) -> Spanned<U>
    where
        F: FnOnce(&T) -> U,
    {
        Spanned {
            value: f(&self.value),
            span: self.span,
        }
    }

    /// Get a reference to the underlying value
    pub fn inner(&self) -> &T {
        &self.value
    }

    /// Consume the Spanned wrapper and return just the inner value
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> std::ops::Deref for Spanned<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl<T: fmt::Display> fmt::Display for Spanned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}

// Spans are ignored so trees parsed from differently formatted sources compare equal.
impl<T: PartialEq> PartialEq for Spanned<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value.eq(&other.value)
    }
}

/// A zero-based `row`/`column` position, with the column counted in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Point {
    pub row: usize,
    pub column: usize,
}

impl Point {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.row, self.column)
    }
}

/// Maps byte offsets to [`Point`]s.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset at which each line starts; always begins with `0`.
    line_starts: Vec<usize>,
}

impl LineIndex {
    /// Build the index for `source`.
    pub fn new(source: &str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(
                source
                    .bytes()
                    .enumerate()
                    .filter(|(_, b)| *b == b'\n')
                    .map(|(i, _)| i + 1),
            )
            .collect();
        Self { line_starts }
    }

    /// Number of lines, counting the (possibly empty) line after a final newline.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Point for a byte offset. Offsets past the end clamp to the last line.
    pub fn point(&self, offset: usize) -> Point {
        let row = match self.line_starts.binary_search(&offset) {
            Ok(row) => row,
            Err(next) => next - 1,
        };
        Point::new(row, offset - self.line_starts[row])
    }

    /// Start and end points of a span.
    pub fn points(&self, span: Span) -> (Point, Point) {
        (self.point(span.start()), self.point(span.end()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_basic_functionality() {
        let span = Span::new(5..10);
        assert_eq!(span.start(), 5);
        assert_eq!(span.end(), 10);
        assert_eq!(span.len(), 5);
        assert!(!span.is_empty());
    }

    #[test]
    fn test_span_empty() {
        let span = Span::empty(5);
        assert_eq!(span.len(), 0);
        assert!(span.is_empty());
    }

    #[test]
    fn test_span_union() {
        let union = Span::new(15..20).union(Span::new(5..10));
        assert_eq!(union.start(), 5);
        assert_eq!(union.end(), 20);
    }

    #[test]
    fn test_spanned_equality_ignores_span() {
        let a = Spanned::new("x", Span::new(0..1));
        let b = Spanned::new("x", Span::new(7..8));
        assert_eq!(a, b);
        assert_eq!(*a.inner(), "x");
    }

    #[test]
    fn test_line_index_points() {
        let index = LineIndex::new("ab\ncd\n\nx");
        assert_eq!(index.line_count(), 4);
        assert_eq!(index.point(0), Point::new(0, 0));
        assert_eq!(index.point(2), Point::new(0, 2));
        assert_eq!(index.point(3), Point::new(1, 0));
        assert_eq!(index.point(6), Point::new(2, 0));
        assert_eq!(index.point(7), Point::new(3, 0));
        assert_eq!(index.point(8), Point::new(3, 1));
    }

    #[test]
    fn test_point_display() {
        assert_eq!(Point::new(3, 14).to_string(), "[3, 14]");
    }
}
