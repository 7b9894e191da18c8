use std::ops::Range;

use serde::Serialize;

/// Half-open byte range `[start, end)` in the contract block of one method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end, "inverted span {start}..{end}");
        Self { start, end }
    }

    /// Smallest span containing both `self` and `other`.
    pub fn merge(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    pub fn to_range(self) -> Range<usize> {
        self.start as usize..self.end as usize
    }
}

/// 1-based line and byte column of an offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineCol {
    pub line: u32,
    pub column: u32,
}

/// Maps byte offsets in a contract block to [`LineCol`] positions.
#[derive(Debug)]
pub struct LineIndex {
    newlines: Vec<u32>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let newlines = source
            .match_indices('\n')
            .map(|(at, _)| at as u32)
            .collect();
        Self { newlines }
    }

    pub fn locate(&self, offset: u32) -> LineCol {
        // A newline belongs to the line it terminates.
        let before = self.newlines.partition_point(|&nl| nl < offset);
        let line_start = match before {
            0 => 0,
            n => self.newlines[n - 1] + 1,
        };
        LineCol {
            line: before as u32 + 1,
            column: offset - line_start + 1,
        }
    }
}
