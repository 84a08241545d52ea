//! Chunk-aware gather
//!
//! Reads the values at an unstructured set of points from an
//! [`ArrayHandle`]. Points requested together tend to be close to each
//! other (particles advected for one time step), so the gather:
//!
//! 1. narrows the handle to the bounding box of the points,
//! 2. gathers directly when the narrowed data is dense,
//! 3. otherwise scans the block grid, reading only blocks that hold points,
//!    one block at a time,
//! 4. and hands over to the handle's vectorized read once the number of
//!    blocks holding points reaches
//!    [`GatherOptions::more_efficient_threshold`].
//!
//! Every path returns the same values for the same input.

mod bounds;
mod options;
mod partition;
mod scan;

pub use options::{
    AUTO_INDEX_CHUNK_BYTES, DEFAULT_MORE_EFFICIENT_THRESHOLD, GatherOptions, IndexChunking,
};

use crate::error::GatherError;
use crate::handle::{ArrayHandle, ChunkedHandle, ReadTally};
use crate::types::Element;
use ndarray::{ArrayBase, ArrayD, Data, Dimension, IxDyn};
use scan::{ScanOutcome, scan_blocks};
use tracing::{debug, debug_span};

/// Strategy a gather ended up using
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GatherPath {
    /// No points were requested
    Empty,
    /// Direct lookup in dense data
    Dense,
    /// Block-by-block reads of the blocks holding points
    Localized,
    /// One vectorized read over the narrowed chunked array
    Fallback,
}

/// What a gather did to produce its result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GatherStats {
    pub path: GatherPath,
    /// Number of points gathered
    pub points: usize,
    /// Blocks examined by the scan
    pub blocks_visited: usize,
    /// Blocks read from the block source
    pub blocks_materialized: usize,
    pub elements_materialized: usize,
    pub bytes_materialized: usize,
}

impl GatherStats {
    fn new(path: GatherPath, points: usize) -> Self {
        Self {
            path,
            points,
            blocks_visited: 0,
            blocks_materialized: 0,
            elements_materialized: 0,
            bytes_materialized: 0,
        }
    }
}

/// Gather with default options
///
/// `indices` holds one index array per dimension of `handle`; all of them
/// must have the same shape, which is also the shape of the result.
pub fn gather<T, S, D>(
    handle: &ArrayHandle<T>,
    indices: &[ArrayBase<S, D>],
) -> Result<ArrayD<T>, GatherError>
where
    T: Element,
    S: Data<Elem = usize>,
    D: Dimension,
{
    gather_with(handle, indices, &GatherOptions::default())
}

/// Gather with explicit options
pub fn gather_with<T, S, D>(
    handle: &ArrayHandle<T>,
    indices: &[ArrayBase<S, D>],
    options: &GatherOptions,
) -> Result<ArrayD<T>, GatherError>
where
    T: Element,
    S: Data<Elem = usize>,
    D: Dimension,
{
    gather_with_stats(handle, indices, options).map(|(values, _)| values)
}

/// Gather with explicit options, reporting how the result was produced
pub fn gather_with_stats<T, S, D>(
    handle: &ArrayHandle<T>,
    indices: &[ArrayBase<S, D>],
    options: &GatherOptions,
) -> Result<(ArrayD<T>, GatherStats), GatherError>
where
    T: Element,
    S: Data<Elem = usize>,
    D: Dimension,
{
    if indices.len() != handle.ndim() {
        return Err(GatherError::DimensionMismatch {
            indices: indices.len(),
            ndim: handle.ndim(),
        });
    }
    let Some(first) = indices.first() else {
        return Err(GatherError::NoIndices);
    };
    options.validate()?;

    let shape = first.shape().to_vec();
    for (axis, idx) in indices.iter().enumerate().skip(1) {
        if idx.shape() != shape.as_slice() {
            return Err(GatherError::IndexShapeMismatch {
                axis,
                expected: shape,
                actual: idx.shape().to_vec(),
            });
        }
    }

    let points = first.len();
    let dtype = T::DTYPE;
    let _span = debug_span!("gather", %dtype, ndim = handle.ndim(), points).entered();

    if points == 0 {
        debug!("no points requested");
        let values = ArrayD::from_shape_vec(IxDyn(&shape), Vec::new())?;
        return Ok((values, GatherStats::new(GatherPath::Empty, 0)));
    }

    let reduced = bounds::reduce(&handle.shape(), indices)?;
    let sliced = handle.slice(&reduced.ranges)?;
    debug!(window = ?reduced.ranges, "narrowed to bounding box");

    let (values, stats) = match &sliced {
        ArrayHandle::Dense(dense) => {
            let values = dense.vindex(&as_points(&reduced.indices))?;
            (values, GatherStats::new(GatherPath::Dense, points))
        }
        ArrayHandle::Chunked(chunked) => gather_chunked::<T>(chunked, &reduced.indices, options)?,
    };

    debug!(path = ?stats.path, blocks = stats.blocks_materialized, "gather finished");
    Ok((ArrayD::from_shape_vec(IxDyn(&shape), values)?, stats))
}

fn gather_chunked<T: Element>(
    chunked: &ChunkedHandle<T>,
    indices: &[Vec<usize>],
    options: &GatherOptions,
) -> Result<(Vec<T>, GatherStats), GatherError> {
    let points = indices.first().map_or(0, Vec::len);
    let partition_len = options.index_chunking.partition_len(points);
    let partitions = partition::partition(indices, partition_len);

    let outcome = scan_blocks(
        chunked.grid(),
        indices,
        &partitions,
        options.more_efficient_threshold,
    );

    match outcome {
        ScanOutcome::Fallback { visited } => {
            debug!(
                visited,
                threshold = options.more_efficient_threshold,
                "too many blocks hold points, switching to vectorized read"
            );
            let (values, tally) = chunked.vindex_tallied(&as_points(indices))?;
            let mut stats = GatherStats::new(GatherPath::Fallback, points);
            stats.blocks_visited = visited;
            record(&mut stats, tally, T::DTYPE.element_size());
            Ok((values, stats))
        }
        ScanOutcome::Localized { matches, visited } => {
            let mut values = vec![T::default(); points];
            let mut tally = ReadTally::default();
            let mut local = vec![0; indices.len()];

            for (coords, found) in matches {
                let block = chunked.read_block(&coords)?;
                tally.blocks += 1;
                tally.elements += block.len();
                for (k, &p) in found.positions.iter().enumerate() {
                    for (slot, axis) in local.iter_mut().zip(&found.local) {
                        *slot = axis[k];
                    }
                    values[p] = block[local.as_slice()];
                }
            }

            let mut stats = GatherStats::new(GatherPath::Localized, points);
            stats.blocks_visited = visited;
            record(&mut stats, tally, T::DTYPE.element_size());
            Ok((values, stats))
        }
    }
}

fn record(stats: &mut GatherStats, tally: ReadTally, element_size: usize) {
    stats.blocks_materialized = tally.blocks;
    stats.elements_materialized = tally.elements;
    stats.bytes_materialized = tally.elements * element_size;
}

fn as_points(indices: &[Vec<usize>]) -> Vec<&[usize]> {
    indices.iter().map(Vec::as_slice).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::MemoryBlocks;
    use ndarray::{Array1, array};

    fn grid_handle() -> (ArrayD<f64>, ArrayHandle<f64>) {
        let data = ArrayD::from_shape_fn(IxDyn(&[50, 60]), |idx| {
            idx[0] as f64 * 100.0 + idx[1] as f64
        });
        let handle = ArrayHandle::chunked(MemoryBlocks::new(data.clone(), &[10, 10]).unwrap());
        (data, handle)
    }

    #[test]
    fn localized_stats() {
        let (_, handle) = grid_handle();
        let rows = array![3usize, 27, 48];
        let cols = array![5usize, 55, 0];
        let (values, stats) =
            gather_with_stats(&handle, &[rows, cols], &GatherOptions::default()).unwrap();

        assert_eq!(values, array![305.0, 2755.0, 4800.0].into_dyn());
        assert_eq!(stats.path, GatherPath::Localized);
        assert_eq!(stats.points, 3);
        assert_eq!(stats.blocks_materialized, 3);
        assert_eq!(stats.bytes_materialized, stats.elements_materialized * 8);
    }

    #[test]
    fn fallback_stats() {
        let (_, handle) = grid_handle();
        let rows = array![3usize, 27, 48];
        let cols = array![5usize, 55, 0];
        let options = GatherOptions::new().with_more_efficient_threshold(1);
        let (values, stats) = gather_with_stats(&handle, &[rows, cols], &options).unwrap();

        assert_eq!(values, array![305.0, 2755.0, 4800.0].into_dyn());
        assert_eq!(stats.path, GatherPath::Fallback);
        assert_eq!(stats.blocks_materialized, 3);
    }

    #[test]
    fn dense_path_reads_nothing() {
        let handle = ArrayHandle::dense(array![[1i32, 2, 3], [4, 5, 6]].into_dyn());
        let (values, stats) = gather_with_stats(
            &handle,
            &[array![1usize, 0], array![2usize, 1]],
            &GatherOptions::default(),
        )
        .unwrap();
        assert_eq!(values, array![6, 2].into_dyn());
        assert_eq!(stats.path, GatherPath::Dense);
        assert_eq!(stats.blocks_materialized, 0);
    }

    #[test]
    fn empty_request() {
        let (_, handle) = grid_handle();
        let empty = Array1::<usize>::zeros(0);
        let (values, stats) =
            gather_with_stats(&handle, &[empty.clone(), empty], &GatherOptions::default())
                .unwrap();
        assert_eq!(values.shape(), &[0]);
        assert_eq!(stats.path, GatherPath::Empty);
    }

    #[test]
    fn invalid_options_fail_before_reading() {
        let (_, handle) = grid_handle();
        let options = GatherOptions::new().with_more_efficient_threshold(0);
        let err = gather_with(&handle, &[array![0usize], array![0usize]], &options).unwrap_err();
        assert!(matches!(err, GatherError::InvalidOptions(_)));
    }

    #[test]
    fn mismatched_index_shapes() {
        let (_, handle) = grid_handle();
        let err = gather(&handle, &[array![0usize, 1].into_dyn(), array![[0usize, 1]].into_dyn()])
            .unwrap_err();
        assert!(matches!(
            err,
            GatherError::IndexShapeMismatch { axis: 1, .. }
        ));
    }
}
