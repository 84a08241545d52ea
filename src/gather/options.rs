//! Tuning knobs for a gather

use crate::error::GatherError;
use std::fmt;
use std::str::FromStr;

/// Number of recorded blocks after which the localized scan gives way to a
/// single vectorized read
pub const DEFAULT_MORE_EFFICIENT_THRESHOLD: usize = 100;

/// Byte budget of one index partition under [`IndexChunking::Auto`]
pub const AUTO_INDEX_CHUNK_BYTES: usize = 128 * 1024 * 1024;

/// How the flattened index arrays are partitioned during the block scan
///
/// Each partition remembers the bounding box of its points so that blocks
/// far away from it can skip the partition entirely. Partitioning never
/// changes the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum IndexChunking {
    /// Size partitions from [`AUTO_INDEX_CHUNK_BYTES`]
    #[default]
    Auto,
    /// Fixed number of points per partition
    Fixed(usize),
}

impl IndexChunking {
    /// Points per partition for an index set of `len` points
    pub fn partition_len(self, len: usize) -> usize {
        let per_partition = match self {
            IndexChunking::Auto => AUTO_INDEX_CHUNK_BYTES / std::mem::size_of::<usize>(),
            IndexChunking::Fixed(n) => n,
        };
        per_partition.clamp(1, len.max(1))
    }
}

impl fmt::Display for IndexChunking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexChunking::Auto => f.write_str("auto"),
            IndexChunking::Fixed(n) => write!(f, "{}", n),
        }
    }
}

impl FromStr for IndexChunking {
    type Err = GatherError;

    /// Accepts `"auto"` or a positive number of points
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Ok(IndexChunking::Auto);
        }
        match s.parse::<usize>() {
            Ok(0) => Err(GatherError::InvalidOptions(
                "index chunk size must be positive".into(),
            )),
            Ok(n) => Ok(IndexChunking::Fixed(n)),
            Err(_) => Err(GatherError::InvalidOptions(format!(
                "index chunking must be \"auto\" or a positive integer, got {:?}",
                s
            ))),
        }
    }
}

/// Options accepted by [`gather_with`](crate::gather_with)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GatherOptions {
    /// Recorded-block count at which the scan falls back to a vectorized read
    pub more_efficient_threshold: usize,
    pub index_chunking: IndexChunking,
}

impl Default for GatherOptions {
    fn default() -> Self {
        Self {
            more_efficient_threshold: DEFAULT_MORE_EFFICIENT_THRESHOLD,
            index_chunking: IndexChunking::Auto,
        }
    }
}

impl GatherOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_more_efficient_threshold(mut self, threshold: usize) -> Self {
        self.more_efficient_threshold = threshold;
        self
    }

    pub fn with_index_chunking(mut self, chunking: IndexChunking) -> Self {
        self.index_chunking = chunking;
        self
    }

    pub fn validate(&self) -> Result<(), GatherError> {
        if self.more_efficient_threshold == 0 {
            return Err(GatherError::InvalidOptions(
                "more_efficient_threshold must be positive".into(),
            ));
        }
        if self.index_chunking == IndexChunking::Fixed(0) {
            return Err(GatherError::InvalidOptions(
                "index chunk size must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = GatherOptions::default();
        assert_eq!(options.more_efficient_threshold, 100);
        assert_eq!(options.index_chunking, IndexChunking::Auto);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn parse_chunking() {
        assert_eq!("auto".parse::<IndexChunking>().unwrap(), IndexChunking::Auto);
        assert_eq!(" AUTO ".parse::<IndexChunking>().unwrap(), IndexChunking::Auto);
        assert_eq!(
            "4096".parse::<IndexChunking>().unwrap(),
            IndexChunking::Fixed(4096)
        );
        assert!(matches!(
            "0".parse::<IndexChunking>(),
            Err(GatherError::InvalidOptions(_))
        ));
        assert!(matches!(
            "big".parse::<IndexChunking>(),
            Err(GatherError::InvalidOptions(_))
        ));
    }

    #[test]
    fn chunking_display_roundtrips() {
        for chunking in [IndexChunking::Auto, IndexChunking::Fixed(17)] {
            assert_eq!(chunking.to_string().parse::<IndexChunking>().unwrap(), chunking);
        }
    }

    #[test]
    fn partition_len_is_clamped() {
        assert_eq!(IndexChunking::Fixed(10).partition_len(3), 3);
        assert_eq!(IndexChunking::Fixed(10).partition_len(25), 10);
        assert_eq!(IndexChunking::Fixed(10).partition_len(0), 1);
        assert_eq!(IndexChunking::Auto.partition_len(1000), 1000);
    }

    #[test]
    fn invalid_options_are_rejected() {
        assert!(
            GatherOptions::new()
                .with_more_efficient_threshold(0)
                .validate()
                .is_err()
        );
        assert!(
            GatherOptions::new()
                .with_index_chunking(IndexChunking::Fixed(0))
                .validate()
                .is_err()
        );
    }
}
