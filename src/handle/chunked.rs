//! Lazily sliced view over a block source

use super::dense::{check_points, check_ranges};
use super::source::BlockSource;
use crate::error::{GatherError, GridError};
use crate::types::{ChunkGrid, Element};
use ndarray::{ArrayD, IxDyn, Slice};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

/// Blocks and elements forced into memory by a read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ReadTally {
    pub blocks: usize,
    pub elements: usize,
}

/// Chunked array, possibly restricted to a rectangular window
///
/// Slicing only narrows the window; no data is read until a block is
/// materialized. Each block of a window lies inside a single block of the
/// underlying source, so reading it costs exactly one source read.
#[derive(Clone)]
pub struct ChunkedHandle<T: Element> {
    source: Arc<dyn BlockSource<T>>,
    grid: ChunkGrid,
    /// Element offset of the window in the source
    origin: Vec<usize>,
    /// Source block coordinates of the window's block 0
    first_block: Vec<usize>,
}

impl<T: Element> ChunkedHandle<T> {
    pub fn new<S: BlockSource<T> + 'static>(source: S) -> Self {
        Self::from_arc(Arc::new(source))
    }

    /// Wrap a shared source
    pub fn from_arc(source: Arc<dyn BlockSource<T>>) -> Self {
        let grid = source.grid().clone();
        let ndim = grid.ndim();
        Self {
            source,
            grid,
            origin: vec![0; ndim],
            first_block: vec![0; ndim],
        }
    }

    pub fn shape(&self) -> Vec<usize> {
        self.grid.shape()
    }

    pub fn ndim(&self) -> usize {
        self.grid.ndim()
    }

    /// Block layout of this window
    pub fn grid(&self) -> &ChunkGrid {
        &self.grid
    }

    /// Narrow the window to one range per axis, without reading data
    pub fn slice(&self, ranges: &[Range<usize>]) -> Result<Self, GridError> {
        check_ranges(&self.shape(), ranges)?;
        let (grid, first) = self.grid.slice(ranges)?;
        let origin = self
            .origin
            .iter()
            .zip(ranges)
            .map(|(&origin, range)| origin + range.start)
            .collect();
        let first_block = self
            .first_block
            .iter()
            .zip(&first)
            .map(|(&base, &first)| base + first)
            .collect();

        Ok(Self {
            source: Arc::clone(&self.source),
            grid,
            origin,
            first_block,
        })
    }

    /// Materialize the block at `coords` of this window
    pub fn read_block(&self, coords: &[usize]) -> Result<ArrayD<T>, GatherError> {
        if !self.grid.contains_block(coords) {
            return Err(GridError::BlockOutOfRange {
                coords: coords.to_vec(),
                num_blocks: self.grid.num_blocks(),
            }
            .into());
        }

        let source_coords: Vec<usize> = coords
            .iter()
            .zip(&self.first_block)
            .map(|(&block, &base)| block + base)
            .collect();

        let source_grid = self.source.grid();
        let block = self
            .source
            .read_block(&source_coords)
            .map_err(|source| GatherError::Block {
                coords: source_coords.clone(),
                source,
            })?;

        let expected = source_grid.block_shape(&source_coords);
        if block.shape() != expected.as_slice() {
            return Err(GatherError::BlockShapeMismatch {
                coords: source_coords,
                expected,
                actual: block.shape().to_vec(),
            });
        }

        let wanted = self.grid.block_shape(coords);
        if wanted == expected {
            return Ok(block);
        }

        // Edge block of the window: cut away what lies outside it
        let clipped = block.slice_each_axis(|ax| {
            let axis = ax.axis.index();
            let block_start = source_grid.offset(axis, source_coords[axis]);
            let window_start = self.origin[axis] + self.grid.offset(axis, coords[axis]);
            let lo = window_start - block_start;
            Slice::new(lo as isize, Some((lo + wanted[axis]) as isize), 1)
        });
        Ok(clipped.to_owned())
    }

    /// Read every block of the window into one dense array
    pub fn materialize(&self) -> Result<ArrayD<T>, GatherError> {
        let mut out = ArrayD::default(IxDyn(&self.shape()));
        for coords in self.grid.iter_blocks() {
            let block = self.read_block(&coords)?;
            let region = self.grid.block_region(&coords);
            out.slice_each_axis_mut(|ax| {
                let range = &region[ax.axis.index()];
                Slice::new(range.start as isize, Some(range.end as isize), 1)
            })
            .assign(&block);
        }
        Ok(out)
    }

    /// Look up one element per point; `points[d][p]` is the coordinate of
    /// point `p` along axis `d`
    ///
    /// Points are grouped by the block that holds them and every touched
    /// block is read once.
    pub fn vindex(&self, points: &[&[usize]]) -> Result<Vec<T>, GatherError> {
        self.vindex_tallied(points).map(|(values, _)| values)
    }

    pub(crate) fn vindex_tallied(
        &self,
        points: &[&[usize]],
    ) -> Result<(Vec<T>, ReadTally), GatherError> {
        check_points(&self.shape(), points)?;
        let len = points.first().map_or(0, |axis| axis.len());

        let mut groups: BTreeMap<Vec<usize>, Vec<usize>> = BTreeMap::new();
        for p in 0..len {
            let key = points
                .iter()
                .enumerate()
                .map(|(axis, coords)| self.grid.block_of(axis, coords[p]).unwrap_or_default())
                .collect();
            groups.entry(key).or_default().push(p);
        }

        let mut values = vec![T::default(); len];
        let mut tally = ReadTally::default();
        let mut local = vec![0; self.ndim()];
        for (coords, positions) in groups {
            let block = self.read_block(&coords)?;
            tally.blocks += 1;
            tally.elements += block.len();
            for p in positions {
                for (axis, slot) in local.iter_mut().enumerate() {
                    *slot = points[axis][p] - self.grid.offset(axis, coords[axis]);
                }
                values[p] = block[local.as_slice()];
            }
        }

        Ok((values, tally))
    }
}

impl<T: Element> fmt::Debug for ChunkedHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkedHandle")
            .field("grid", &self.grid)
            .field("origin", &self.origin)
            .field("first_block", &self.first_block)
            .finish_non_exhaustive()
    }
}
