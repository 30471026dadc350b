use std::ops::Range;

/// A byte range `[start, end)` into the buffer.
///
/// Spans are plain values; the registry owns the authoritative copy for
/// every discovered node and rewrites it as edits land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Span {
    /// Inclusive start byte offset.
    pub start: usize,
    /// Exclusive end byte offset.
    pub end: usize,
}

impl Span {
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Returns the length in bytes. Uses saturating subtraction for safety.
    #[must_use]
    pub fn len(self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns true if the span is empty (start >= end).
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    /// True when `other` lies within `self` (equal spans contain each other).
    #[must_use]
    pub fn contains(self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// True when neither span contains the other but they share bytes.
    #[must_use]
    pub fn straddles(self, other: Span) -> bool {
        let overlap = self.start < other.end && other.start < self.end;
        overlap && !self.contains(other) && !other.contains(self)
    }

    /// Moves the span right by `offset` bytes.
    #[must_use]
    pub fn offset(self, offset: usize) -> Span {
        Span::new(self.start + offset, self.end + offset)
    }

    /// Expresses the span relative to `base`, which must not exceed `start`.
    #[must_use]
    pub fn relative_to(self, base: usize) -> Span {
        Span::new(self.start - base, self.end - base)
    }

    #[must_use]
    pub fn range(self) -> Range<usize> {
        self.start..self.end
    }

    /// Orders spans by ascending start, outer spans before inner ones.
    pub fn document_order(a: &Span, b: &Span) -> std::cmp::Ordering {
        a.start.cmp(&b.start).then(b.end.cmp(&a.end))
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Span::new(range.start, range.end)
    }
}
