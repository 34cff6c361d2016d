// ============================================================
// Layer 3 — Snapshot Index Ranges
// ============================================================
// The cylinder dataset is split by time index, not shuffled:
//   train 0..3500, validation 3500..4250, test 4250..5000.
// Consecutive snapshots are strongly correlated, so a random
// split would leak the validation set into training.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Half-open range of snapshot indices, written `start..end` on the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRange {
    pub start: usize,
    pub end:   usize,
}

impl IndexRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot index for position `i` inside this range.
    pub fn index(&self, i: usize) -> Option<usize> {
        (i < self.len()).then(|| self.start + i)
    }

    /// True if every index in the range is below `limit`.
    pub fn fits(&self, limit: usize) -> bool {
        self.end <= limit
    }
}

impl fmt::Display for IndexRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl FromStr for IndexRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once("..")
            .ok_or_else(|| format!("expected START..END, got '{s}'"))?;
        let start = start.trim().parse::<usize>()
            .map_err(|e| format!("bad range start '{start}': {e}"))?;
        let end = end.trim().parse::<usize>()
            .map_err(|e| format!("bad range end '{end}': {e}"))?;
        if end < start {
            return Err(format!("range end {end} is before start {start}"));
        }
        Ok(Self { start, end })
    }
}
