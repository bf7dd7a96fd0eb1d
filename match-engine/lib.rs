//! Pairwise putative matching over an image collection.
//!
//! For each left image `i` the engine builds one nearest-neighbour index,
//! queries it with the descriptors of every right image `j` in the pair
//! window, keeps matches passing the 2-NN ratio test and removes duplicate
//! and coordinate-colliding matches. Right images are processed in parallel;
//! results land in a [`PairwiseMatchTable`] keyed by `(i, j)`, `i < j`.

pub mod error;
pub mod pairs;
pub mod progress;
pub mod scheduler;

pub use error::{MatchError, MatchResult, PairFailure};
pub use pairs::{pair_count, pair_window, planned_pairs};
pub use progress::{LogProgress, NoProgress, Progress};
pub use scheduler::SparseMatcher;

pub use match_core::{ImageCollection, MatcherConfig, PairKey, PairwiseMatchTable};

use match_core::DescriptorBin;

/// Match a collection with brute-force search and no progress reporting
pub fn match_collection<B: DescriptorBin>(
    collection: &ImageCollection<B>,
    config: MatcherConfig,
) -> MatchResult<PairwiseMatchTable> {
    SparseMatcher::new(config)?.match_collection(collection)
}
