//! Error types for chunkgather

/// Error raised by a [`BlockSource`](crate::BlockSource) while reading a block
///
/// Storage backends are free to fail with whatever error type they use; it is
/// carried through the gather unchanged.
pub type BlockError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced by a gather
#[derive(Debug, thiserror::Error)]
pub enum GatherError {
    /// The index tuple does not have one array per dimension
    #[error("index tuple does not match the number of dimensions: {indices} vs {ndim}")]
    DimensionMismatch { indices: usize, ndim: usize },

    /// A zero-dimensional array was gathered with an empty index tuple
    #[error("at least one index array is required")]
    NoIndices,

    /// The index arrays do not share one shape
    #[error("index array {axis} has shape {actual:?}, expected {expected:?}")]
    IndexShapeMismatch {
        axis: usize,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// An index lies outside its axis
    #[error("index {index} is out of bounds for axis {axis} with length {len}")]
    IndexOutOfBounds {
        axis: usize,
        index: usize,
        len: usize,
    },

    /// Options failed validation
    #[error("invalid gather options: {0}")]
    InvalidOptions(String),

    /// A block source returned a block with the wrong shape
    #[error("block {coords:?} has shape {actual:?}, expected {expected:?}")]
    BlockShapeMismatch {
        coords: Vec<usize>,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// A block source failed to read a block
    #[error("failed to read block {coords:?}: {source}")]
    Block {
        coords: Vec<usize>,
        #[source]
        source: BlockError,
    },

    /// Chunk grid metadata is inconsistent with the request
    #[error("Grid error: {0}")]
    Grid(#[from] GridError),

    /// Wrapper around ndarray shape failures
    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

/// Errors specific to chunk grid metadata
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    /// A per-axis argument has the wrong number of entries
    #[error("expected {expected} dimensions, got {actual}")]
    RankMismatch { expected: usize, actual: usize },

    /// A non-empty axis was given a zero-sized block
    #[error("axis {axis} has a zero-sized block")]
    ZeroBlock { axis: usize },

    /// An array does not have the shape its grid describes
    #[error("array shape {shape:?} does not match grid shape {grid:?}")]
    ShapeMismatch { shape: Vec<usize>, grid: Vec<usize> },

    /// A slice does not fit inside its axis
    #[error("slice {start}..{end} is out of range for axis {axis} with length {len}")]
    SliceOutOfRange {
        axis: usize,
        start: usize,
        end: usize,
        len: usize,
    },

    /// Block coordinates lie outside the grid
    #[error("block {coords:?} is outside a grid of {num_blocks:?} blocks")]
    BlockOutOfRange {
        coords: Vec<usize>,
        num_blocks: Vec<usize>,
    },
}
