//! Block scan of the localized path
//!
//! Walks the block grid in row-major order and records, for every block that
//! holds requested points, which flattened positions fall in it and their
//! block-local coordinates.

use super::partition::IndexPartition;
use crate::types::ChunkGrid;
use std::collections::BTreeMap;
use tracing::trace;

/// Block coordinates in the grid
pub(crate) type BlockKey = Vec<usize>;

/// Points found inside one block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct BlockMatch {
    /// Flattened positions of the points
    pub positions: Vec<usize>,
    /// `local[d][k]` is the block-local coordinate of `positions[k]` on axis `d`
    pub local: Vec<Vec<usize>>,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ScanOutcome {
    /// Every point was assigned to a recorded block
    Localized {
        matches: BTreeMap<BlockKey, BlockMatch>,
        visited: usize,
    },
    /// Too many blocks hold points; read them all at once instead
    Fallback { visited: usize },
}

/// Assign every point to its block, or give up once `threshold` blocks have
/// been recorded and more remain to be visited
pub(crate) fn scan_blocks(
    grid: &ChunkGrid,
    indices: &[Vec<usize>],
    partitions: &[IndexPartition],
    threshold: usize,
) -> ScanOutcome {
    let total = indices.first().map_or(0, Vec::len);
    let ndim = grid.ndim();

    let mut matches: BTreeMap<BlockKey, BlockMatch> = BTreeMap::new();
    let mut matched = 0;
    let mut visited = 0;

    for coords in grid.iter_blocks() {
        if matches.len() >= threshold {
            return ScanOutcome::Fallback { visited };
        }
        visited += 1;

        let start: Vec<usize> = (0..ndim).map(|axis| grid.offset(axis, coords[axis])).collect();
        let size = grid.block_shape(&coords);
        let end: Vec<usize> = start.iter().zip(&size).map(|(s, n)| s + n).collect();

        let mut found = BlockMatch {
            positions: Vec::new(),
            local: vec![Vec::new(); ndim],
        };
        let mut local = vec![0; ndim];
        for part in partitions.iter().filter(|part| part.overlaps(&start, &end)) {
            'points: for p in part.positions.clone() {
                for axis in 0..ndim {
                    match indices[axis][p].checked_sub(start[axis]) {
                        Some(shifted) if shifted < size[axis] => local[axis] = shifted,
                        _ => continue 'points,
                    }
                }
                found.positions.push(p);
                for (axis, &shifted) in local.iter().enumerate() {
                    found.local[axis].push(shifted);
                }
            }
        }

        if found.positions.is_empty() {
            continue;
        }

        trace!(block = ?coords, points = found.positions.len(), "block holds points");
        matched += found.positions.len();
        matches.insert(coords, found);

        if matched == total {
            break;
        }
    }

    ScanOutcome::Localized { matches, visited }
}

#[cfg(test)]
mod tests {
    use super::super::partition::partition;
    use super::*;

    fn grid_10x10() -> ChunkGrid {
        ChunkGrid::from_regular(&[100, 100], &[10, 10]).unwrap()
    }

    #[test]
    fn points_in_one_block() {
        let indices = vec![vec![31, 35, 39], vec![40, 49, 42]];
        let parts = partition(&indices, 16);
        let outcome = scan_blocks(&grid_10x10(), &indices, &parts, 100);

        let ScanOutcome::Localized { matches, visited } = outcome else {
            panic!("expected localized scan");
        };
        assert_eq!(visited, 35);
        assert_eq!(matches.len(), 1);
        let found = &matches[&vec![3, 4]];
        assert_eq!(found.positions, vec![0, 1, 2]);
        assert_eq!(found.local, vec![vec![1, 5, 9], vec![0, 9, 2]]);
    }

    #[test]
    fn scan_stops_once_all_points_are_found() {
        let indices = vec![vec![5, 15], vec![5, 15]];
        let grid = ChunkGrid::from_regular(&[20, 20], &[10, 10]).unwrap();
        let parts = partition(&indices, 16);
        let ScanOutcome::Localized { matches, visited } = scan_blocks(&grid, &indices, &parts, 100)
        else {
            panic!("expected localized scan");
        };
        assert_eq!(visited, 4);
        assert_eq!(
            matches.keys().cloned().collect::<Vec<_>>(),
            vec![vec![0, 0], vec![1, 1]]
        );
    }

    #[test]
    fn fallback_once_threshold_is_reached() {
        let indices = vec![vec![0, 55, 99], vec![0, 55, 99]];
        let parts = partition(&indices, 16);
        let outcome = scan_blocks(&grid_10x10(), &indices, &parts, 2);
        // (0,0) and (5,5) are recorded; the block after (5,5) trips the guard
        assert_eq!(outcome, ScanOutcome::Fallback { visited: 56 });
    }

    #[test]
    fn threshold_not_checked_after_last_point() {
        let indices = vec![vec![0, 99], vec![0, 99]];
        let parts = partition(&indices, 16);
        let outcome = scan_blocks(&grid_10x10(), &indices, &parts, 2);
        assert!(matches!(outcome, ScanOutcome::Localized { visited: 100, .. }));
    }

    #[test]
    fn partitioning_does_not_change_matches() {
        let indices = vec![vec![3, 97, 50, 12, 12, 88], vec![4, 2, 50, 77, 78, 88]];
        let whole = scan_blocks(&grid_10x10(), &indices, &partition(&indices, 100), 100);
        let split = scan_blocks(&grid_10x10(), &indices, &partition(&indices, 2), 100);
        assert_eq!(whole, split);
    }
}
