//! Block storage backends
//!
//! A [`BlockSource`] is where chunked data actually lives: an on-disk store,
//! a remote object store, or plain memory. The gather only ever asks it for
//! the grid layout and for single blocks.

use crate::error::{BlockError, GridError};
use crate::types::{ChunkGrid, Element};
use ndarray::{ArrayD, Slice};

/// Storage that can materialize one block of a chunked array at a time
pub trait BlockSource<T: Element>: Send + Sync {
    /// Layout of the full array held by this source
    fn grid(&self) -> &ChunkGrid;

    /// Materialize the block at `coords`
    ///
    /// The returned array must have the shape `self.grid().block_shape(coords)`.
    /// Reading one block must not force any other block into memory.
    fn read_block(&self, coords: &[usize]) -> Result<ArrayD<T>, BlockError>;
}

/// In-memory array partitioned into blocks
///
/// Each read copies one block out of the backing array, which mirrors the
/// cost model of an out-of-core store closely enough for tests and small
/// datasets.
#[derive(Debug, Clone)]
pub struct MemoryBlocks<T> {
    data: ArrayD<T>,
    grid: ChunkGrid,
}

impl<T: Element> MemoryBlocks<T> {
    /// Partition `data` into regular blocks of `block_shape`
    pub fn new(data: ArrayD<T>, block_shape: &[usize]) -> Result<Self, GridError> {
        let grid = ChunkGrid::from_regular(data.shape(), block_shape)?;
        Ok(Self { data, grid })
    }

    /// Partition `data` along an explicit, possibly irregular grid
    pub fn with_grid(data: ArrayD<T>, grid: ChunkGrid) -> Result<Self, GridError> {
        if data.shape() != grid.shape().as_slice() {
            return Err(GridError::ShapeMismatch {
                shape: data.shape().to_vec(),
                grid: grid.shape(),
            });
        }
        Ok(Self { data, grid })
    }

    pub fn data(&self) -> &ArrayD<T> {
        &self.data
    }
}

impl<T: Element> BlockSource<T> for MemoryBlocks<T> {
    fn grid(&self) -> &ChunkGrid {
        &self.grid
    }

    fn read_block(&self, coords: &[usize]) -> Result<ArrayD<T>, BlockError> {
        if !self.grid.contains_block(coords) {
            return Err(Box::new(GridError::BlockOutOfRange {
                coords: coords.to_vec(),
                num_blocks: self.grid.num_blocks(),
            }));
        }

        let region = self.grid.block_region(coords);
        let block = self.data.slice_each_axis(|ax| {
            let range = &region[ax.axis.index()];
            Slice::new(range.start as isize, Some(range.end as isize), 1)
        });
        Ok(block.to_owned())
    }
}
