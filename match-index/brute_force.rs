use match_core::DescriptorBin;
use rayon::prelude::*;

use crate::error::IndexResult;
use crate::{IndexBuilder, NeighborIndex, Neighbours, check_build, check_query};

/// Exact linear-scan search. Works for any descriptor width.
#[derive(Debug, Clone, Copy, Default)]
pub struct BruteForce;

impl<B: DescriptorBin> IndexBuilder<B> for BruteForce {
    type Index<'a>
        = BruteForceIndex<'a, B>
    where
        B: 'a;

    fn build<'a>(&self, descriptors: &'a [B], count: usize, dimension: usize) -> IndexResult<Self::Index<'a>> {
        BruteForceIndex::new(descriptors, count, dimension)
    }

    fn name(&self) -> &'static str {
        "brute-force"
    }
}

/// Borrowing view over an image's descriptors
#[derive(Debug, Clone, Copy)]
pub struct BruteForceIndex<'a, B> {
    descriptors: &'a [B],
    count: usize,
    dimension: usize,
}

impl<'a, B: DescriptorBin> BruteForceIndex<'a, B> {
    pub fn new(descriptors: &'a [B], count: usize, dimension: usize) -> IndexResult<Self> {
        check_build(descriptors, count, dimension)?;
        Ok(Self {
            descriptors,
            count,
            dimension,
        })
    }

    /// Fill `indices`/`distances` (length k) with the k best rows, nearest first.
    /// Ties keep the lower row index first.
    fn k_nearest(&self, query: &[B], indices: &mut [usize], distances: &mut [f32]) {
        let k = indices.len();
        let mut filled = 0;
        for (row, candidate) in self.descriptors.chunks_exact(self.dimension).enumerate() {
            let d = B::squared_distance(query, candidate);
            if filled == k && d >= distances[k - 1] {
                continue;
            }
            let mut pos = if filled < k {
                filled += 1;
                filled - 1
            } else {
                k - 1
            };
            while pos > 0 && distances[pos - 1] > d {
                distances[pos] = distances[pos - 1];
                indices[pos] = indices[pos - 1];
                pos -= 1;
            }
            distances[pos] = d;
            indices[pos] = row;
        }
    }
}

impl<B: DescriptorBin> NeighborIndex<B> for BruteForceIndex<'_, B> {
    fn len(&self) -> usize {
        self.count
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn query(&self, queries: &[B], query_count: usize, k: usize) -> IndexResult<Neighbours> {
        if !check_query(self.count, self.dimension, queries, query_count, k)? {
            return Ok(Neighbours::empty(k));
        }

        let mut indices = vec![0usize; query_count * k];
        let mut distances = vec![f32::INFINITY; query_count * k];
        indices
            .par_chunks_mut(k)
            .zip(distances.par_chunks_mut(k))
            .zip(queries.par_chunks_exact(self.dimension))
            .for_each(|((idx, dist), query)| self.k_nearest(query, idx, dist));

        Ok(Neighbours::new(k, indices, distances))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IndexError;
    use proptest::prelude::*;

    #[test]
    fn test_exact_match_is_nearest() {
        let data: Vec<u8> = vec![10, 10, 10, 200, 200, 200, 12, 9, 10];
        let index = BruteForce.build(&data, 3, 3).unwrap();
        let result = index.query(&[200, 200, 200], 1, 2).unwrap();
        assert_eq!(result.indices(0), &[1, 2]);
        assert_eq!(result.distances(0)[0], 0.0);
    }

    #[test]
    fn test_ties_prefer_lower_index() {
        let data = [1.0f32, 1.0, 1.0];
        let index = BruteForceIndex::new(&data, 3, 1).unwrap();
        let result = index.query(&[1.0], 1, 2).unwrap();
        assert_eq!(result.indices(0), &[0, 1]);
    }

    #[test]
    fn test_insufficient_neighbours() {
        let data = [3u8, 4];
        let index = BruteForceIndex::new(&data, 1, 2).unwrap();
        let result = index.query(&[3, 4], 1, 2);
        assert_eq!(
            result,
            Err(IndexError::InsufficientNeighbors { available: 1, requested: 2 })
        );
    }

    #[test]
    fn test_query_width_mismatch() {
        let data = [0u8; 8];
        let index = BruteForceIndex::new(&data, 2, 4).unwrap();
        assert!(matches!(
            index.query(&[0u8; 6], 1, 2),
            Err(IndexError::DimensionMismatch { expected: 4, actual: 6 })
        ));
    }

    #[test]
    fn test_empty_query_set() {
        let data = [0u8; 8];
        let index = BruteForceIndex::new(&data, 2, 4).unwrap();
        let result = index.query(&[], 0, 2).unwrap();
        assert_eq!(result.query_count(), 0);
    }

    proptest! {
        #[test]
        fn prop_matches_sorted_scan(
            data in prop::collection::vec(0u8..32, 8..64),
            query in prop::collection::vec(0u8..32, 4),
            k in 1usize..3,
        ) {
            let count = data.len() / 4;
            let data = &data[..count * 4];
            let index = BruteForceIndex::new(data, count, 4).unwrap();
            let result = index.query(&query, 1, k).unwrap();

            let mut expected: Vec<(f32, usize)> = data
                .chunks_exact(4)
                .enumerate()
                .map(|(i, row)| (u8::squared_distance(&query, row), i))
                .collect();
            expected.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

            for n in 0..k {
                prop_assert_eq!(result.distances(0)[n], expected[n].0);
                prop_assert_eq!(result.indices(0)[n], expected[n].1);
            }
        }
    }
}
