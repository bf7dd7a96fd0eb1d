use std::path::PathBuf;

use match_core::CollectionError;
use match_engine::MatchError;
use thiserror::Error;

/// Failure reading one image's feature or descriptor file
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}:{line}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },
    #[error("{}: expected {expected} bytes, found {actual}", .path.display())]
    Truncated {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },
    #[error("{}: header announces {count} descriptors, more than can be addressed", .path.display())]
    ImpossibleCount { path: PathBuf, count: u64 },
    #[error(transparent)]
    Collection(#[from] CollectionError),
}

/// Failure reading a putative matches file
#[derive(Debug, Error)]
pub enum MatchFileError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed matches file: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum SparseMatchError {
    #[error("loading failed: {0}")]
    Load(#[from] CollectionError),
    #[error("matching failed: {0}")]
    Match(#[from] MatchError),
    #[error("kd-tree index supports descriptor widths 32, 64 and 128, not {0}")]
    UnsupportedKdTreeDimension(usize),
}

pub type StoreResult<T> = Result<T, StoreError>;
pub type SparseMatchResult<T> = Result<T, SparseMatchError>;
