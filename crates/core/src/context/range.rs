use serde::Serialize;

/// Half-open byte range `[start, end)` into the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct StringRange {
    /// First byte covered.
    pub start: usize,
    /// One past the last byte covered.
    pub end: usize,
}

impl StringRange {
    /// A range covering `[start, end)`.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Empty range at `pos`.
    pub fn at(pos: usize) -> Self {
        Self::new(pos, pos)
    }

    /// Alias for [`StringRange::new`].
    pub fn between(start: usize, end: usize) -> Self {
        Self::new(start, end)
    }

    /// Smallest range containing both `a` and `b`.
    pub fn encompassing(a: StringRange, b: StringRange) -> Self {
        Self::new(a.start.min(b.start), a.end.max(b.end))
    }

    /// The covered slice of `input`, or `""` when out of bounds.
    pub fn get<'a>(&self, input: &'a str) -> &'a str {
        input.get(self.start..self.end).unwrap_or("")
    }

    /// True when `start == end`.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Number of bytes covered.
    pub fn len(&self) -> usize {
        self.end - self.start
    }
}
