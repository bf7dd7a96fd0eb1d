use match_core::{ConfigError, ImageId, PairKey};
use match_index::IndexError;
use thiserror::Error;

/// A pair whose nearest-neighbour query failed
#[derive(Debug, Clone, PartialEq)]
pub struct PairFailure {
    pub pair: PairKey,
    pub error: IndexError,
}

impl std::fmt::Display for PairFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pair {}: {}", self.pair, self.error)
    }
}

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("matching cancelled")]
    Cancelled,
    #[error("cannot index image {image}: {error}")]
    IndexBuild { image: ImageId, error: IndexError },
    #[error("{} pair(s) failed: {}", .0.len(), join_failures(.0))]
    PairFailures(Vec<PairFailure>),
}

pub type MatchResult<T> = Result<T, MatchError>;

fn join_failures(failures: &[PairFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
