//! Partitioning of the flattened index space

use std::ops::Range;

/// Contiguous run of flattened positions with its bounding box
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct IndexPartition {
    pub positions: Range<usize>,
    /// Smallest coordinate per axis
    pub lo: Vec<usize>,
    /// Largest coordinate per axis, inclusive
    pub hi: Vec<usize>,
}

impl IndexPartition {
    /// Whether the box overlaps the half-open region `start..end`
    pub fn overlaps(&self, start: &[usize], end: &[usize]) -> bool {
        (0..self.lo.len()).all(|axis| self.lo[axis] < end[axis] && self.hi[axis] >= start[axis])
    }
}

/// Split `indices` into runs of at most `len` positions
pub(crate) fn partition(indices: &[Vec<usize>], len: usize) -> Vec<IndexPartition> {
    let total = indices.first().map_or(0, Vec::len);
    let len = len.max(1);

    (0..total)
        .step_by(len)
        .map(|start| {
            let positions = start..(start + len).min(total);
            let (lo, hi) = indices
                .iter()
                .map(|axis| {
                    axis[positions.clone()]
                        .iter()
                        .fold((usize::MAX, 0), |(lo, hi), &i| (lo.min(i), hi.max(i)))
                })
                .unzip();
            IndexPartition { positions, lo, hi }
        })
        .collect()
}
