//! Feature store, putative matches file and the `sparse-match` pipeline.
//!
//! [`FeatureStore`] reads per-image `.feat`/`.desc` files into an
//! [`ImageCollection`], [`SparseMatchPipeline`] matches it with the chosen
//! backend, and [`save_matches`] writes the resulting table.

pub mod error;
pub mod matches_file;
pub mod store;

pub use error::{MatchFileError, SparseMatchError, SparseMatchResult, StoreError, StoreResult};
pub use matches_file::{PUTATIVE_MATCHES_FILE, load_matches, parse_matches, save_matches, write_matches};
pub use store::{FeatureStore, read_image_list};

pub use match_core::{self, CandidateMatch, ImageCollection, MatcherConfig, PairKey, PairwiseMatchTable};
pub use match_engine::{self, LogProgress, MatchError, Progress, SparseMatcher};

use match_core::DescriptorBin;
use match_index::{BruteForce, IndexBuilder, KdTree};

/// Nearest-neighbour backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum IndexKind {
    /// Exact linear scan, any descriptor width
    #[default]
    BruteForce,
    /// kd-tree, descriptor widths 32, 64 or 128
    KdTree,
}

/// Descriptor bin type of the `.desc` files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum BinKind {
    #[default]
    U8,
    F32,
}

/// Loads a collection from a [`FeatureStore`] and matches it.
pub struct SparseMatchPipeline {
    store: FeatureStore,
    config: MatcherConfig,
    index: IndexKind,
}

impl SparseMatchPipeline {
    pub fn new(store: FeatureStore, config: MatcherConfig, index: IndexKind) -> Self {
        Self { store, config, index }
    }

    pub fn store(&self) -> &FeatureStore {
        &self.store
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Load every image first; matching only starts if all of them loaded.
    pub fn run<B: DescriptorBin>(&self, images: &[String], progress: &dyn Progress) -> SparseMatchResult<PairwiseMatchTable> {
        let collection = self.store.load_collection::<B>(images)?;
        self.match_loaded(&collection, progress)
    }

    pub fn match_loaded<B: DescriptorBin>(
        &self,
        collection: &ImageCollection<B>,
        progress: &dyn Progress,
    ) -> SparseMatchResult<PairwiseMatchTable> {
        match self.index {
            IndexKind::BruteForce => self.match_with(BruteForce, collection, progress),
            IndexKind::KdTree => match self.store.dimension() {
                32 => self.match_with(KdTree::<32>, collection, progress),
                64 => self.match_with(KdTree::<64>, collection, progress),
                128 => self.match_with(KdTree::<128>, collection, progress),
                other => Err(SparseMatchError::UnsupportedKdTreeDimension(other)),
            },
        }
    }

    fn match_with<B, X>(
        &self,
        builder: X,
        collection: &ImageCollection<B>,
        progress: &dyn Progress,
    ) -> SparseMatchResult<PairwiseMatchTable>
    where
        B: DescriptorBin,
        X: IndexBuilder<B>,
    {
        let matcher = SparseMatcher::with_index(self.config.clone(), builder)?;
        Ok(matcher.match_collection_with_progress(collection, progress)?)
    }
}
