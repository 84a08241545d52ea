//! Fully materialized array handle

use crate::error::{GatherError, GridError};
use crate::types::{ChunkGrid, Element};
use ndarray::{ArcArray, ArrayD, ArrayViewD, IxDyn, Slice};
use std::ops::Range;

/// Array already held in memory
///
/// Backed by a reference-counted array so that slicing never copies data.
#[derive(Debug, Clone)]
pub struct DenseHandle<T: Element> {
    data: ArcArray<T, IxDyn>,
}

impl<T: Element> DenseHandle<T> {
    pub fn new(data: ArrayD<T>) -> Self {
        Self {
            data: data.into_shared(),
        }
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn ndim(&self) -> usize {
        self.data.ndim()
    }

    /// Borrow the underlying array
    pub fn view(&self) -> ArrayViewD<'_, T> {
        self.data.view()
    }

    /// Dense data behaves as a grid with a single block
    pub fn grid(&self) -> ChunkGrid {
        ChunkGrid::single(self.shape())
    }

    /// Zero-copy view of one range per axis
    pub fn slice(&self, ranges: &[Range<usize>]) -> Result<Self, GridError> {
        check_ranges(self.shape(), ranges)?;
        let mut data = self.data.clone();
        data.slice_each_axis_inplace(|ax| {
            let range = &ranges[ax.axis.index()];
            Slice::new(range.start as isize, Some(range.end as isize), 1)
        });
        Ok(Self { data })
    }

    pub fn materialize(&self) -> ArrayD<T> {
        self.data.to_owned()
    }

    /// Look up one element per point; `points[d][p]` is the coordinate of
    /// point `p` along axis `d`
    pub fn vindex(&self, points: &[&[usize]]) -> Result<Vec<T>, GatherError> {
        check_points(self.shape(), points)?;
        let len = points.first().map_or(0, |axis| axis.len());

        let mut coords = vec![0; self.ndim()];
        let mut values = Vec::with_capacity(len);
        for p in 0..len {
            for (coord, axis) in coords.iter_mut().zip(points) {
                *coord = axis[p];
            }
            values.push(self.data[coords.as_slice()]);
        }
        Ok(values)
    }
}

impl<T: Element> From<ArrayD<T>> for DenseHandle<T> {
    fn from(data: ArrayD<T>) -> Self {
        Self::new(data)
    }
}

pub(crate) fn check_ranges(shape: &[usize], ranges: &[Range<usize>]) -> Result<(), GridError> {
    if ranges.len() != shape.len() {
        return Err(GridError::RankMismatch {
            expected: shape.len(),
            actual: ranges.len(),
        });
    }
    for (axis, (range, &len)) in ranges.iter().zip(shape).enumerate() {
        if range.start > range.end || range.end > len {
            return Err(GridError::SliceOutOfRange {
                axis,
                start: range.start,
                end: range.end,
                len,
            });
        }
    }
    Ok(())
}

/// Validate point coordinates against an array shape
pub(crate) fn check_points(shape: &[usize], points: &[&[usize]]) -> Result<(), GatherError> {
    if points.len() != shape.len() {
        return Err(GatherError::DimensionMismatch {
            indices: points.len(),
            ndim: shape.len(),
        });
    }
    let len = points.first().map_or(0, |axis| axis.len());
    for (axis, (coords, &dim)) in points.iter().zip(shape).enumerate() {
        if coords.len() != len {
            return Err(GatherError::IndexShapeMismatch {
                axis,
                expected: vec![len],
                actual: vec![coords.len()],
            });
        }
        if let Some(&index) = coords.iter().find(|&&index| index >= dim) {
            return Err(GatherError::IndexOutOfBounds {
                axis,
                index,
                len: dim,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn slice_is_a_view_of_the_same_data() {
        let handle = DenseHandle::new(array![[0, 1, 2], [3, 4, 5], [6, 7, 8]].into_dyn());
        let sliced = handle.slice(&[1..3, 0..2]).unwrap();
        assert_eq!(sliced.shape(), &[2, 2]);
        assert_eq!(sliced.materialize(), array![[3, 4], [6, 7]].into_dyn());
    }

    #[test]
    fn vindex_gathers_points() {
        let handle = DenseHandle::new(array![[0.0f32, 1.0], [2.0, 3.0]].into_dyn());
        let rows = [1, 0, 1];
        let cols = [1, 1, 0];
        let values = handle.vindex(&[&rows, &cols]).unwrap();
        assert_eq!(values, vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn vindex_rejects_out_of_bounds() {
        let handle = DenseHandle::new(array![[1u8, 2], [3, 4]].into_dyn());
        let err = handle.vindex(&[&[0, 2], &[0, 0]]).unwrap_err();
        assert!(matches!(
            err,
            GatherError::IndexOutOfBounds {
                axis: 0,
                index: 2,
                len: 2
            }
        ));
    }

    #[test]
    fn grid_is_one_block() {
        let handle = DenseHandle::new(ArrayD::<i64>::zeros(IxDyn(&[3, 7])));
        assert_eq!(handle.grid().chunks(), &[vec![3], vec![7]]);
    }
}
