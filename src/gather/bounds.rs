//! Bounding-slice reduction
//!
//! Shrinks the array to the smallest box holding every requested point and
//! moves the indices into that box's coordinate frame.

use crate::error::GatherError;
use ndarray::{ArrayBase, Data, Dimension};
use std::ops::Range;

/// Slice along one axis; `None` ends are open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AxisSlice {
    pub start: Option<usize>,
    pub stop: Option<usize>,
}

impl AxisSlice {
    /// Element range of the slice on an axis of length `len`
    pub fn range(&self, len: usize) -> Range<usize> {
        self.start.unwrap_or(0)..self.stop.unwrap_or(len)
    }
}

/// Indices flattened and shifted into the bounding box
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Reduced {
    pub slices: Vec<AxisSlice>,
    pub ranges: Vec<Range<usize>>,
    /// `indices[d][p]` is the box coordinate of point `p` along axis `d`
    pub indices: Vec<Vec<usize>>,
}

/// Compute the bounding box of `indices` within `shape` and shift into it
///
/// Index arrays are flattened in logical row-major order. The index set must
/// not be empty.
pub(crate) fn reduce<S, D>(
    shape: &[usize],
    indices: &[ArrayBase<S, D>],
) -> Result<Reduced, GatherError>
where
    S: Data<Elem = usize>,
    D: Dimension,
{
    let mut slices = Vec::with_capacity(shape.len());
    let mut ranges = Vec::with_capacity(shape.len());
    let mut shifted = Vec::with_capacity(shape.len());

    for (axis, (idx, &len)) in indices.iter().zip(shape).enumerate() {
        let (lo, hi) = idx
            .iter()
            .fold((usize::MAX, 0), |(lo, hi), &i| (lo.min(i), hi.max(i)));
        if hi >= len {
            return Err(GatherError::IndexOutOfBounds {
                axis,
                index: hi,
                len,
            });
        }

        let slice = AxisSlice {
            start: (lo > 0).then_some(lo),
            stop: (hi + 1 < len).then_some(hi + 1),
        };
        let flat: Vec<usize> = match slice.start {
            Some(start) => idx.iter().map(|&i| i - start).collect(),
            None => idx.iter().copied().collect(),
        };

        ranges.push(slice.range(len));
        slices.push(slice);
        shifted.push(flat);
    }

    Ok(Reduced {
        slices,
        ranges,
        indices: shifted,
    })
}
