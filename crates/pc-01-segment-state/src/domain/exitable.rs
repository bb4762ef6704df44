//! # Exitable Ranges
//!
//! Ranges that may currently be withdrawn to the base chain, ordered by
//! `(token_id, start)`. A fresh manager holds one `(0, 0, 0)` placeholder.

use super::errors::SegmentStateError;
use super::segment::Segment;
use serde::{Deserialize, Serialize};

/// A possibly-empty range. Unlike [`Segment`], `start == end` is allowed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitableRange {
    /// Token id
    pub token_id: u64,
    /// Range start
    pub start: u64,
    /// Range end
    pub end: u64,
}

impl ExitableRange {
    /// The placeholder range.
    pub const fn empty() -> Self {
        Self {
            token_id: 0,
            start: 0,
            end: 0,
        }
    }

    fn covers(&self, token_id: u64, start: u64, end: u64) -> bool {
        self.token_id == token_id && self.start <= start && self.end >= end
    }
}

/// Ordered exitable ranges.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<ExitableRange>", into = "Vec<ExitableRange>")]
pub struct ExitableRangeManager {
    ranges: Vec<ExitableRange>,
}

impl Default for ExitableRangeManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ExitableRangeManager {
    /// Manager with only the placeholder.
    pub fn new() -> Self {
        Self {
            ranges: vec![ExitableRange::empty()],
        }
    }

    /// Restore from stored ranges.
    pub fn with_ranges(ranges: Vec<ExitableRange>) -> Self {
        let mut manager = Self { ranges };
        if manager.ranges.is_empty() {
            manager.ranges.push(ExitableRange::empty());
        }
        manager.sort();
        manager
    }

    /// Current ranges.
    pub fn ranges(&self) -> &[ExitableRange] {
        &self.ranges
    }

    /// Add `[start, end)`, extending a range of the same token that ends at `start`.
    pub fn insert(&mut self, token_id: u64, start: u64, end: u64) {
        if let Some(left) = self
            .ranges
            .iter_mut()
            .find(|r| r.token_id == token_id && r.end == start)
        {
            left.end = end;
            return;
        }
        self.ranges.push(ExitableRange {
            token_id,
            start,
            end,
        });
        self.sort();
    }

    /// Remove `[start, end)` from its unique covering range.
    pub fn remove(&mut self, token_id: u64, start: u64, end: u64) -> Result<(), SegmentStateError> {
        let index = self.covering_index(token_id, start, end)?;
        let cover = self.ranges[index];
        if cover.end > end {
            self.ranges[index].start = end;
        } else {
            self.ranges.remove(index);
        }
        if cover.start < start {
            self.insert(token_id, cover.start, start);
        }
        self.sort();
        Ok(())
    }

    /// The unique range covering `[start, end)`.
    pub fn get_exitable_range(
        &self,
        token_id: u64,
        start: u64,
        end: u64,
    ) -> Result<ExitableRange, SegmentStateError> {
        self.covering_index(token_id, start, end)
            .map(|i| self.ranges[i])
    }

    /// End of the range covering `segment`.
    pub fn exitable_end(&self, segment: &Segment) -> Result<u64, SegmentStateError> {
        self.get_exitable_range(segment.token_id(), segment.start(), segment.end())
            .map(|r| r.end)
    }

    fn covering_index(&self, token_id: u64, start: u64, end: u64) -> Result<usize, SegmentStateError> {
        let covering: Vec<usize> = self
            .ranges
            .iter()
            .enumerate()
            .filter(|(_, r)| r.covers(token_id, start, end))
            .map(|(i, _)| i)
            .collect();
        match covering.as_slice() {
            [index] => Ok(*index),
            [] => Err(SegmentStateError::ExitableRangeNotFound {
                token_id,
                start,
                end,
            }),
            _ => Err(SegmentStateError::AmbiguousExitableRange {
                token_id,
                start,
                end,
                count: covering.len(),
            }),
        }
    }

    fn sort(&mut self) {
        self.ranges.sort_by_key(|r| (r.token_id, r.start));
    }
}

impl From<Vec<ExitableRange>> for ExitableRangeManager {
    fn from(ranges: Vec<ExitableRange>) -> Self {
        Self::with_ranges(ranges)
    }
}

impl From<ExitableRangeManager> for Vec<ExitableRange> {
    fn from(manager: ExitableRangeManager) -> Self {
        manager.ranges
    }
}
