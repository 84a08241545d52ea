//! Chunk grid metadata
//!
//! A [`ChunkGrid`] records how each axis of a logical N-dimensional array is
//! partitioned into blocks. It carries no data; handles use it to locate
//! blocks, and the gather uses it to decide which blocks to read.

use crate::error::GridError;
use std::ops::Range;

/// Per-axis block sizes of a chunked array
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkGrid {
    chunks: Vec<Vec<usize>>,
    /// Cumulative block starts per axis, with the axis length appended
    offsets: Vec<Vec<usize>>,
}

impl ChunkGrid {
    /// Create a grid from explicit block sizes per axis
    ///
    /// Blocks may be irregular. An axis with no blocks has length zero.
    pub fn new(chunks: Vec<Vec<usize>>) -> Result<Self, GridError> {
        if let Some(axis) = chunks.iter().position(|sizes| sizes.contains(&0)) {
            return Err(GridError::ZeroBlock { axis });
        }
        Ok(Self::build(chunks))
    }

    fn build(chunks: Vec<Vec<usize>>) -> Self {
        let offsets = chunks
            .iter()
            .map(|sizes| {
                let mut acc = Vec::with_capacity(sizes.len() + 1);
                let mut start = 0;
                acc.push(start);
                for &size in sizes {
                    start += size;
                    acc.push(start);
                }
                acc
            })
            .collect();

        Self { chunks, offsets }
    }

    /// Create a regular grid; the last block along an axis may be shorter
    pub fn from_regular(shape: &[usize], block_shape: &[usize]) -> Result<Self, GridError> {
        if shape.len() != block_shape.len() {
            return Err(GridError::RankMismatch {
                expected: shape.len(),
                actual: block_shape.len(),
            });
        }

        let mut chunks = Vec::with_capacity(shape.len());
        for (axis, (&len, &block)) in shape.iter().zip(block_shape).enumerate() {
            if len == 0 {
                chunks.push(Vec::new());
                continue;
            }
            if block == 0 {
                return Err(GridError::ZeroBlock { axis });
            }
            let mut sizes = vec![block; len / block];
            if len % block != 0 {
                sizes.push(len % block);
            }
            chunks.push(sizes);
        }

        Self::new(chunks)
    }

    /// A grid holding the whole array in one block
    pub fn single(shape: &[usize]) -> Self {
        let chunks = shape
            .iter()
            .map(|&len| if len == 0 { Vec::new() } else { vec![len] })
            .collect();
        Self::build(chunks)
    }

    pub fn ndim(&self) -> usize {
        self.chunks.len()
    }

    /// Length of every axis
    pub fn shape(&self) -> Vec<usize> {
        self.offsets
            .iter()
            .map(|acc| acc.last().copied().unwrap_or(0))
            .collect()
    }

    /// Block sizes per axis
    pub fn chunks(&self) -> &[Vec<usize>] {
        &self.chunks
    }

    /// Number of blocks along each axis
    pub fn num_blocks(&self) -> Vec<usize> {
        self.chunks.iter().map(Vec::len).collect()
    }

    /// Total number of blocks in the grid
    pub fn total_blocks(&self) -> usize {
        self.chunks.iter().map(Vec::len).product()
    }

    /// Start of `block` along `axis`, in array coordinates
    pub fn offset(&self, axis: usize, block: usize) -> usize {
        self.offsets[axis][block]
    }

    pub fn block_size(&self, axis: usize, block: usize) -> usize {
        self.chunks[axis][block]
    }

    /// Shape of the block at `coords`
    pub fn block_shape(&self, coords: &[usize]) -> Vec<usize> {
        coords
            .iter()
            .enumerate()
            .map(|(axis, &block)| self.chunks[axis][block])
            .collect()
    }

    /// Element range covered by the block at `coords`, per axis
    pub fn block_region(&self, coords: &[usize]) -> Vec<Range<usize>> {
        coords
            .iter()
            .enumerate()
            .map(|(axis, &block)| self.offsets[axis][block]..self.offsets[axis][block + 1])
            .collect()
    }

    pub fn contains_block(&self, coords: &[usize]) -> bool {
        coords.len() == self.ndim()
            && coords
                .iter()
                .zip(&self.chunks)
                .all(|(&block, sizes)| block < sizes.len())
    }

    /// Block along `axis` that holds element `index`
    pub fn block_of(&self, axis: usize, index: usize) -> Option<usize> {
        let acc = &self.offsets[axis];
        if index >= acc.last().copied().unwrap_or(0) {
            return None;
        }
        Some(acc.partition_point(|&start| start <= index) - 1)
    }

    /// Iterate over block coordinates in row-major order
    pub fn iter_blocks(&self) -> BlockIter {
        BlockIter::new(self.num_blocks())
    }

    /// Clip the grid to one range per axis
    ///
    /// Returns the clipped grid and, per axis, the block of `self` that
    /// becomes block 0 of the clipped grid. Every clipped block lies inside
    /// exactly one block of `self`.
    pub fn slice(&self, ranges: &[Range<usize>]) -> Result<(ChunkGrid, Vec<usize>), GridError> {
        if ranges.len() != self.ndim() {
            return Err(GridError::RankMismatch {
                expected: self.ndim(),
                actual: ranges.len(),
            });
        }

        let shape = self.shape();
        let mut chunks = Vec::with_capacity(ranges.len());
        let mut first_blocks = Vec::with_capacity(ranges.len());

        for (axis, range) in ranges.iter().enumerate() {
            if range.start > range.end || range.end > shape[axis] {
                return Err(GridError::SliceOutOfRange {
                    axis,
                    start: range.start,
                    end: range.end,
                    len: shape[axis],
                });
            }
            if range.is_empty() {
                chunks.push(Vec::new());
                first_blocks.push(0);
                continue;
            }

            // Both ends are in range, checked above
            let first = self.block_of(axis, range.start).unwrap_or_default();
            let last = self.block_of(axis, range.end - 1).unwrap_or_default();
            let sizes = (first..=last)
                .map(|block| {
                    let lo = self.offset(axis, block).max(range.start);
                    let hi = self.offset(axis, block + 1).min(range.end);
                    hi - lo
                })
                .collect();
            chunks.push(sizes);
            first_blocks.push(first);
        }

        Ok((ChunkGrid::new(chunks)?, first_blocks))
    }
}

/// Row-major iterator over the block coordinates of a grid
#[derive(Debug, Clone)]
pub struct BlockIter {
    num_blocks: Vec<usize>,
    next: Option<Vec<usize>>,
}

impl BlockIter {
    fn new(num_blocks: Vec<usize>) -> Self {
        let next = if num_blocks.contains(&0) {
            None
        } else {
            Some(vec![0; num_blocks.len()])
        };
        Self { num_blocks, next }
    }
}

impl Iterator for BlockIter {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;

        let mut advanced = current.clone();
        for axis in (0..advanced.len()).rev() {
            advanced[axis] += 1;
            if advanced[axis] < self.num_blocks[axis] {
                self.next = Some(advanced);
                break;
            }
            advanced[axis] = 0;
        }

        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regular_grid_with_ragged_tail() {
        let grid = ChunkGrid::from_regular(&[25, 10], &[10, 4]).unwrap();
        assert_eq!(grid.chunks(), &[vec![10, 10, 5], vec![4, 4, 2]]);
        assert_eq!(grid.shape(), vec![25, 10]);
        assert_eq!(grid.num_blocks(), vec![3, 3]);
        assert_eq!(grid.total_blocks(), 9);
        assert_eq!(grid.offset(0, 2), 20);
        assert_eq!(grid.block_shape(&[2, 2]), vec![5, 2]);
        assert_eq!(grid.block_region(&[1, 2]), vec![10..20, 8..10]);
    }

    #[test]
    fn zero_sized_block_is_rejected() {
        assert_eq!(
            ChunkGrid::new(vec![vec![3, 0, 2]]),
            Err(GridError::ZeroBlock { axis: 0 })
        );
        assert_eq!(
            ChunkGrid::from_regular(&[4, 4], &[2, 0]),
            Err(GridError::ZeroBlock { axis: 1 })
        );
    }

    #[test]
    fn empty_axis_has_no_blocks() {
        let grid = ChunkGrid::from_regular(&[0, 6], &[0, 3]).unwrap();
        assert_eq!(grid.shape(), vec![0, 6]);
        assert_eq!(grid.total_blocks(), 0);
        assert_eq!(grid.iter_blocks().count(), 0);
    }

    #[test]
    fn block_of_irregular_axis() {
        let grid = ChunkGrid::new(vec![vec![3, 1, 5]]).unwrap();
        assert_eq!(grid.block_of(0, 0), Some(0));
        assert_eq!(grid.block_of(0, 2), Some(0));
        assert_eq!(grid.block_of(0, 3), Some(1));
        assert_eq!(grid.block_of(0, 4), Some(2));
        assert_eq!(grid.block_of(0, 8), Some(2));
        assert_eq!(grid.block_of(0, 9), None);
    }

    #[test]
    fn iteration_is_row_major() {
        let grid = ChunkGrid::from_regular(&[4, 6], &[2, 2]).unwrap();
        let blocks: Vec<_> = grid.iter_blocks().collect();
        assert_eq!(
            blocks,
            vec![
                vec![0, 0],
                vec![0, 1],
                vec![0, 2],
                vec![1, 0],
                vec![1, 1],
                vec![1, 2],
            ]
        );
    }

    #[test]
    fn zero_dimensional_grid_has_one_block() {
        let grid = ChunkGrid::new(Vec::new()).unwrap();
        assert_eq!(grid.total_blocks(), 1);
        assert_eq!(grid.iter_blocks().collect::<Vec<_>>(), vec![Vec::<usize>::new()]);
    }

    #[test]
    fn slice_clips_edge_blocks() {
        let grid = ChunkGrid::from_regular(&[50, 60], &[10, 10]).unwrap();
        let (sliced, first) = grid.slice(&[3..49, 20..25]).unwrap();
        assert_eq!(sliced.chunks(), &[vec![7, 10, 10, 10, 9], vec![5]]);
        assert_eq!(first, vec![0, 2]);
        assert_eq!(sliced.shape(), vec![46, 5]);
    }

    #[test]
    fn slice_rejects_out_of_range() {
        let grid = ChunkGrid::from_regular(&[10], &[5]).unwrap();
        assert_eq!(
            grid.slice(&[4..11]).unwrap_err(),
            GridError::SliceOutOfRange {
                axis: 0,
                start: 4,
                end: 11,
                len: 10
            }
        );
        assert!(matches!(
            grid.slice(&[0..5, 0..5]),
            Err(GridError::RankMismatch { .. })
        ));
    }
}
