use thiserror::Error;

/// A single image that could not be loaded, with the reason reported by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadFailure {
    pub image: String,
    pub reason: String,
}

impl LoadFailure {
    pub fn new(image: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.image, self.reason)
    }
}

#[derive(Debug, Clone, Error)]
pub enum CollectionError {
    #[error("failed to load {} image(s): {}", .failures.len(), join_failures(.failures))]
    LoadFailure { failures: Vec<LoadFailure> },
    #[error("image {image}: {features} features but {descriptors} descriptors")]
    FeatureCountMismatch {
        image: String,
        features: usize,
        descriptors: usize,
    },
    #[error("image {image}: descriptor dimension {actual}, collection uses {expected}")]
    DimensionMismatch {
        image: String,
        expected: usize,
        actual: usize,
    },
    #[error("descriptor buffer of {len} bins is not a multiple of dimension {dimension}")]
    MalformedDescriptors { len: usize, dimension: usize },
    #[error("descriptor dimension must be > 0")]
    EmptyDimension,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid ratio threshold: {0} (must be finite and > 0)")]
    InvalidRatio(f32),
    #[error("invalid thread count: {0} (must be >= 1)")]
    InvalidThreads(usize),
}

pub type CollectionResult<T> = Result<T, CollectionError>;
pub type ConfigResult<T> = Result<T, ConfigError>;

fn join_failures(failures: &[LoadFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
