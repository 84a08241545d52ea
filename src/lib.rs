//! chunkgather - Chunk-aware sparse gathers from N-dimensional arrays
//!
//! Reads the values at an unstructured set of points from an array that is
//! either held in memory or split into independently readable blocks, such as
//! a velocity field in an out-of-core chunked store sampled at the positions
//! of Lagrangian particles.
//!
//! # Features
//!
//! - Narrows every read to the bounding box of the requested points
//! - Reads only blocks that hold requested points, one at a time
//! - Falls back to a single vectorized read when points are spread over many blocks
//! - Index arrays of any shape; the result has the same shape
//! - Pluggable block storage through [`BlockSource`]
//!
//! # Example
//!
//! ```rust
//! use chunkgather::{ArrayHandle, MemoryBlocks, gather};
//! use ndarray::{ArrayD, IxDyn, array};
//!
//! let data = ArrayD::from_shape_fn(IxDyn(&[50, 60]), |idx| (idx[0] * 60 + idx[1]) as f64);
//! let handle = ArrayHandle::chunked(MemoryBlocks::new(data, &[10, 10]).unwrap());
//!
//! let rows = array![3usize, 27, 48];
//! let cols = array![5usize, 55, 0];
//! let values = gather(&handle, &[rows, cols]).unwrap();
//!
//! assert_eq!(values, array![185.0, 1675.0, 2880.0].into_dyn());
//! ```

pub mod error;
pub mod gather;
pub mod handle;
pub mod types;

// Re-export common types at crate root
pub use error::{BlockError, GatherError, GridError};
pub use gather::{
    GatherOptions, GatherPath, GatherStats, IndexChunking, gather, gather_with, gather_with_stats,
};
pub use handle::{ArrayHandle, BlockSource, ChunkedHandle, DenseHandle, MemoryBlocks};
pub use types::{BlockIter, ChunkGrid, DType, Element};
