//! Array handles
//!
//! An [`ArrayHandle`] is either dense data already in memory or a chunked
//! array whose blocks are read on demand from a [`BlockSource`]. Both
//! variants expose the same capabilities; the gather dispatches on the
//! variant to pick its strategy.

mod chunked;
mod dense;
mod source;

pub use chunked::ChunkedHandle;
pub use dense::DenseHandle;
pub use source::{BlockSource, MemoryBlocks};

pub(crate) use chunked::ReadTally;

use crate::error::{GatherError, GridError};
use crate::types::{ChunkGrid, DType, Element};
use ndarray::ArrayD;
use std::ops::Range;

/// N-dimensional array the gather can read from
#[derive(Debug, Clone)]
pub enum ArrayHandle<T: Element> {
    Dense(DenseHandle<T>),
    Chunked(ChunkedHandle<T>),
}

impl<T: Element> ArrayHandle<T> {
    /// Handle over in-memory data
    pub fn dense(data: ArrayD<T>) -> Self {
        ArrayHandle::Dense(DenseHandle::new(data))
    }

    /// Handle over a block source
    pub fn chunked<S: BlockSource<T> + 'static>(source: S) -> Self {
        ArrayHandle::Chunked(ChunkedHandle::new(source))
    }

    pub fn dtype(&self) -> DType {
        T::DTYPE
    }

    pub fn shape(&self) -> Vec<usize> {
        match self {
            ArrayHandle::Dense(dense) => dense.shape().to_vec(),
            ArrayHandle::Chunked(chunked) => chunked.shape(),
        }
    }

    pub fn ndim(&self) -> usize {
        match self {
            ArrayHandle::Dense(dense) => dense.ndim(),
            ArrayHandle::Chunked(chunked) => chunked.ndim(),
        }
    }

    pub fn is_chunked(&self) -> bool {
        matches!(self, ArrayHandle::Chunked(_))
    }

    /// Block layout; dense data is a single block
    pub fn grid(&self) -> ChunkGrid {
        match self {
            ArrayHandle::Dense(dense) => dense.grid(),
            ArrayHandle::Chunked(chunked) => chunked.grid().clone(),
        }
    }

    /// Restrict to one range per axis; chunked handles stay lazy
    pub fn slice(&self, ranges: &[Range<usize>]) -> Result<Self, GridError> {
        Ok(match self {
            ArrayHandle::Dense(dense) => ArrayHandle::Dense(dense.slice(ranges)?),
            ArrayHandle::Chunked(chunked) => ArrayHandle::Chunked(chunked.slice(ranges)?),
        })
    }

    /// Materialize the block at `coords`
    pub fn read_block(&self, coords: &[usize]) -> Result<ArrayD<T>, GatherError> {
        match self {
            ArrayHandle::Dense(dense) => {
                let grid = dense.grid();
                if !grid.contains_block(coords) {
                    return Err(GridError::BlockOutOfRange {
                        coords: coords.to_vec(),
                        num_blocks: grid.num_blocks(),
                    }
                    .into());
                }
                Ok(dense.materialize())
            }
            ArrayHandle::Chunked(chunked) => chunked.read_block(coords),
        }
    }

    /// Materialize the whole array
    pub fn materialize(&self) -> Result<ArrayD<T>, GatherError> {
        match self {
            ArrayHandle::Dense(dense) => Ok(dense.materialize()),
            ArrayHandle::Chunked(chunked) => chunked.materialize(),
        }
    }

    /// Vectorized random-access read of one element per point
    pub fn vindex(&self, points: &[&[usize]]) -> Result<Vec<T>, GatherError> {
        match self {
            ArrayHandle::Dense(dense) => dense.vindex(points),
            ArrayHandle::Chunked(chunked) => chunked.vindex(points),
        }
    }
}

impl<T: Element> From<ArrayD<T>> for ArrayHandle<T> {
    fn from(data: ArrayD<T>) -> Self {
        ArrayHandle::dense(data)
    }
}

impl<T: Element> From<DenseHandle<T>> for ArrayHandle<T> {
    fn from(dense: DenseHandle<T>) -> Self {
        ArrayHandle::Dense(dense)
    }
}

impl<T: Element> From<ChunkedHandle<T>> for ArrayHandle<T> {
    fn from(chunked: ChunkedHandle<T>) -> Self {
        ArrayHandle::Chunked(chunked)
    }
}
