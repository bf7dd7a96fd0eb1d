//! Turns raw 2-NN results for one image pair into putative matches:
//! ratio test, then index dedup, then coordinate dedup.

pub mod dedup;
pub mod ratio;

pub use dedup::{deduplicate_coordinates, deduplicate_indices};
pub use ratio::RatioTest;

use match_core::{CandidateMatch, Feature};

/// Neighbours per query needed by the ratio test
pub const RATIO_TEST_NEIGHBOURS: usize = 2;

/// Match counts after each filtering stage of one pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub queries: usize,
    pub after_ratio: usize,
    pub after_identity: usize,
    pub after_coordinates: usize,
}

/// Full filtering chain applied to every image pair
#[derive(Debug, Clone, Copy)]
pub struct PairFilter {
    ratio: RatioTest,
}

impl PairFilter {
    pub fn new(ratio_threshold: f32) -> Self {
        Self {
            ratio: RatioTest::new(ratio_threshold),
        }
    }

    pub fn ratio_test(&self) -> &RatioTest {
        &self.ratio
    }

    /// Filter the `k`-NN result of querying the right image against the left image's index.
    pub fn run(
        &self,
        indices: &[usize],
        distances: &[f32],
        k: usize,
        left_features: &[Feature],
        right_features: &[Feature],
    ) -> (Vec<CandidateMatch>, FilterStats) {
        let mut stats = FilterStats {
            queries: distances.len() / k.max(1),
            ..FilterStats::default()
        };

        let mut matches = self.ratio.apply(indices, distances, k);
        stats.after_ratio = matches.len();

        deduplicate_indices(&mut matches);
        stats.after_identity = matches.len();

        deduplicate_coordinates(&mut matches, left_features, right_features);
        stats.after_coordinates = matches.len();

        (matches, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_stages() {
        let left = [
            Feature::new(0.0, 0.0),
            Feature::new(10.0, 0.0),
            Feature::new(10.0, 0.0),
        ];
        let right = [
            Feature::new(1.0, 1.0),
            Feature::new(2.0, 2.0),
            Feature::new(3.0, 3.0),
            Feature::new(4.0, 4.0),
        ];
        // q0 -> 0 clear, q1 ambiguous, q2 -> 1 clear, q3 -> 2 clear but shares left position with q2
        let indices = [0, 1, 2, 0, 1, 0, 2, 0];
        let distances = [1.0, 9.0, 4.0, 4.1, 0.5, 8.0, 0.1, 6.0];

        let (matches, stats) = PairFilter::new(0.8).run(&indices, &distances, 2, &left, &right);
        let pairs: Vec<_> = matches.iter().map(CandidateMatch::indices).collect();
        assert_eq!(pairs, vec![(0, 0), (1, 2)]);
        assert_eq!(
            stats,
            FilterStats {
                queries: 4,
                after_ratio: 3,
                after_identity: 3,
                after_coordinates: 2,
            }
        );
    }

    #[test]
    fn test_no_queries() {
        let (matches, stats) = PairFilter::new(0.8).run(&[], &[], 2, &[], &[]);
        assert!(matches.is_empty());
        assert_eq!(stats, FilterStats::default());
    }
}
