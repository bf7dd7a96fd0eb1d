//! Nearest-neighbour search over one image's descriptors.
//!
//! An index is built from a borrowed descriptor buffer and answers k-NN
//! queries for descriptors of other images. Distances are squared Euclidean
//! so they can be fed straight into the squared ratio test.

pub mod brute_force;
pub mod error;
pub mod kdtree;

pub use brute_force::{BruteForce, BruteForceIndex};
pub use error::{IndexError, IndexResult};
pub use kdtree::{KdTree, KdTreeIndex};

use match_core::DescriptorBin;

/// Result of a k-NN query, flattened: neighbour `n` of query `q` is at `q * k + n`.
/// Each query's neighbours are ordered by increasing distance.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbours {
    k: usize,
    indices: Vec<usize>,
    distances: Vec<f32>,
}

impl Neighbours {
    pub(crate) fn new(k: usize, indices: Vec<usize>, distances: Vec<f32>) -> Self {
        debug_assert_eq!(indices.len(), distances.len());
        Self { k, indices, distances }
    }

    pub(crate) fn empty(k: usize) -> Self {
        Self::new(k, Vec::new(), Vec::new())
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn query_count(&self) -> usize {
        if self.k == 0 { 0 } else { self.indices.len() / self.k }
    }

    pub fn indices(&self, query: usize) -> &[usize] {
        &self.indices[query * self.k..(query + 1) * self.k]
    }

    pub fn distances(&self, query: usize) -> &[f32] {
        &self.distances[query * self.k..(query + 1) * self.k]
    }

    pub fn all_indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn all_distances(&self) -> &[f32] {
        &self.distances
    }
}

/// Read-only k-NN structure over one image's descriptors.
pub trait NeighborIndex<B: DescriptorBin>: Sync {
    /// Number of indexed descriptors
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn dimension(&self) -> usize;

    /// Find the `k` closest indexed descriptors for each of `query_count`
    /// contiguous query descriptors.
    ///
    /// Fails with [`IndexError::InsufficientNeighbors`] rather than returning
    /// fewer than `k` neighbours.
    fn query(&self, queries: &[B], query_count: usize, k: usize) -> IndexResult<Neighbours>;
}

/// Constructs a [`NeighborIndex`] over a borrowed descriptor buffer.
///
/// The buffer must outlive the index and stay unmodified while it exists.
pub trait IndexBuilder<B: DescriptorBin>: Send + Sync {
    type Index<'a>: NeighborIndex<B>
    where
        B: 'a;

    fn build<'a>(&self, descriptors: &'a [B], count: usize, dimension: usize) -> IndexResult<Self::Index<'a>>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

/// Shared argument checks for [`NeighborIndex::query`] implementations.
///
/// Returns `Ok(false)` when there is nothing to search for.
pub(crate) fn check_query<B>(
    indexed: usize,
    dimension: usize,
    queries: &[B],
    query_count: usize,
    k: usize,
) -> IndexResult<bool> {
    if queries.len() != query_count * dimension {
        let actual = if query_count == 0 { queries.len() } else { queries.len() / query_count };
        return Err(IndexError::DimensionMismatch {
            expected: dimension,
            actual,
        });
    }
    if query_count == 0 || k == 0 {
        return Ok(false);
    }
    if indexed < k {
        return Err(IndexError::InsufficientNeighbors {
            available: indexed,
            requested: k,
        });
    }
    Ok(true)
}

pub(crate) fn check_build<B>(descriptors: &[B], count: usize, dimension: usize) -> IndexResult<()> {
    if dimension == 0 || descriptors.len() != count * dimension {
        return Err(IndexError::MalformedDescriptors {
            len: descriptors.len(),
            count,
            dimension,
        });
    }
    Ok(())
}
