use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use match_core::{
    CandidateMatch, DescriptorBin, ImageCollection, ImageDescriptorSet, MatcherConfig, PairKey,
    PairwiseMatchTable, build_thread_pool,
};
use match_filter::{FilterStats, PairFilter, RATIO_TEST_NEIGHBOURS};
use match_index::{BruteForce, IndexBuilder, IndexResult, NeighborIndex};
use parking_lot::Mutex;
use rayon::prelude::*;

use crate::error::{MatchError, MatchResult, PairFailure};
use crate::pairs::{pair_count, pair_window};
use crate::progress::{NoProgress, Progress};

/// State shared by the parallel pair units; one lock guards all of it.
struct SharedResults {
    table: PairwiseMatchTable,
    failures: Vec<PairFailure>,
    completed: usize,
}

/// Computes putative matches for every scheduled image pair of a collection.
///
/// Left images are processed one after another: each gets one index, which is
/// queried in parallel by the descriptors of every right image in its window
/// and dropped before the next left image is indexed.
pub struct SparseMatcher<X = BruteForce> {
    config: MatcherConfig,
    builder: X,
    cancel: Option<Arc<AtomicBool>>,
}

impl SparseMatcher<BruteForce> {
    /// Matcher using exact brute-force search
    pub fn new(config: MatcherConfig) -> MatchResult<Self> {
        Self::with_index(config, BruteForce)
    }
}

impl<X> SparseMatcher<X> {
    pub fn with_index(config: MatcherConfig, builder: X) -> MatchResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            builder,
            cancel: None,
        })
    }

    /// Stop the run at the next left image or pair once `flag` is set.
    /// Queries already in flight finish first.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Number of pairs a collection of `n` images will produce
    pub fn planned_pair_count(&self, n: usize) -> usize {
        pair_count(n, self.config.pair_radius)
    }

    fn check_cancelled(&self) -> MatchResult<()> {
        match &self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(MatchError::Cancelled),
            _ => Ok(()),
        }
    }

    pub fn match_collection<B>(&self, collection: &ImageCollection<B>) -> MatchResult<PairwiseMatchTable>
    where
        B: DescriptorBin,
        X: IndexBuilder<B>,
    {
        self.match_collection_with_progress(collection, &NoProgress)
    }

    /// Match all scheduled pairs, reporting each finished pair to `progress`.
    ///
    /// Every pair is attempted even if some fail; any failure makes the whole
    /// run return [`MatchError::PairFailures`] listing the failed pairs, so a
    /// partial table is never returned. Pairs involving an image without
    /// features produce an empty entry.
    pub fn match_collection_with_progress<B, P>(
        &self,
        collection: &ImageCollection<B>,
        progress: &P,
    ) -> MatchResult<PairwiseMatchTable>
    where
        B: DescriptorBin,
        X: IndexBuilder<B>,
        P: Progress + ?Sized,
    {
        let started = Instant::now();
        let n = collection.len();
        let radius = self.config.pair_radius;
        let total = pair_count(n, radius);
        log::info!(
            "{} over {} images ({} index), {} pairs",
            self.config.summary(),
            n,
            IndexBuilder::<B>::name(&self.builder),
            total
        );

        let pool = build_thread_pool(self.config.n_threads)?;
        let filter = PairFilter::new(self.config.ratio_threshold);
        let shared = Mutex::new(SharedResults {
            table: PairwiseMatchTable::new(),
            failures: Vec::new(),
            completed: 0,
        });
        progress.begin(total);

        pool.install(|| -> MatchResult<()> {
            for left in collection.image_ids() {
                self.check_cancelled()?;
                let window = pair_window(left, n, radius);
                if window.is_empty() {
                    continue;
                }

                let left_image = &collection[left];
                let index = if left_image.is_empty() {
                    None
                } else {
                    let descriptors = left_image.descriptors();
                    let index = self
                        .builder
                        .build(descriptors.as_slice(), descriptors.len(), descriptors.dimension())
                        .map_err(|error| MatchError::IndexBuild { image: left, error })?;
                    Some(index)
                };
                log::debug!(
                    "image {} ({}): {} features, right images {:?}",
                    left,
                    left_image.name(),
                    left_image.len(),
                    window
                );

                window.into_par_iter().try_for_each(|right| -> MatchResult<()> {
                    self.check_cancelled()?;
                    let pair = PairKey::new(left, right);
                    let outcome = match_pair(index.as_ref(), left_image, &collection[right], &filter);
                    if let Ok((matches, stats)) = &outcome {
                        log::trace!("pair {}: {:?} -> {} matches", pair, stats, matches.len());
                    }

                    let mut results = shared.lock();
                    match outcome {
                        Ok((matches, _)) => {
                            let previous = results.table.insert(pair, matches);
                            debug_assert!(previous.is_none(), "pair {} matched twice", pair);
                        }
                        Err(error) => results.failures.push(PairFailure { pair, error }),
                    }
                    results.completed += 1;
                    progress.pair_completed(pair, results.completed, total);
                    Ok(())
                })?;
            }
            Ok(())
        })?;

        let SharedResults { table, mut failures, .. } = shared.into_inner();
        if !failures.is_empty() {
            failures.sort_by_key(|f| f.pair);
            for failure in &failures {
                log::warn!("{}", failure);
            }
            return Err(MatchError::PairFailures(failures));
        }

        log::info!(
            "{} putative matches over {} pairs in {:.2?}",
            table.total_matches(),
            table.len(),
            started.elapsed()
        );
        Ok(table)
    }
}

/// Query the right image against the left image's index and filter the result.
/// `index` is `None` when the left image has no features.
fn match_pair<B, I>(
    index: Option<&I>,
    left: &ImageDescriptorSet<B>,
    right: &ImageDescriptorSet<B>,
    filter: &PairFilter,
) -> IndexResult<(Vec<CandidateMatch>, FilterStats)>
where
    B: DescriptorBin,
    I: NeighborIndex<B>,
{
    let index = match index {
        Some(index) if !right.is_empty() => index,
        _ => return Ok((Vec::new(), FilterStats::default())),
    };
    let queries = right.descriptors();
    let neighbours = index.query(queries.as_slice(), queries.len(), RATIO_TEST_NEIGHBOURS)?;
    Ok(filter.run(
        neighbours.all_indices(),
        neighbours.all_distances(),
        neighbours.k(),
        left.features(),
        right.features(),
    ))
}
