use serde::{Deserialize, Serialize};

/// A half-open byte-span `[start, end)` into the text handed to the parser.
///
/// The parser only ever sees normalized markup, so spans point into the
/// output of [`crate::normalize`], not into the persisted content string.
/// Offsets are UTF-8 byte offsets and always land on char boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, Hash)]
pub struct Span {
    pub start: u64,
    pub end: u64,
}

impl Span {
    #[inline]
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(start <= end, "Span start must be <= end");
        Self { start, end }
    }

    /// Span between two `usize` offsets, as produced by line slicing.
    #[inline]
    pub fn from_range(start: usize, end: usize) -> Self {
        Self::new(start as u64, end.max(start) as u64)
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Returns a span that covers both `self` and `other`.
    #[inline]
    pub fn cover(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}
