use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("index holds {available} descriptor(s), {requested} neighbours requested")]
    InsufficientNeighbors { available: usize, requested: usize },
    #[error("descriptor width mismatch: index uses {expected}, query has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("descriptor buffer of {len} bins does not hold {count} descriptors of width {dimension}")]
    MalformedDescriptors {
        len: usize,
        count: usize,
        dimension: usize,
    },
    #[error("index is compiled for dimension {expected}, data has {actual}")]
    UnsupportedDimension { expected: usize, actual: usize },
    #[error("descriptor {row} has a non-finite bin")]
    NonFiniteDescriptor { row: usize },
}

pub type IndexResult<T> = Result<T, IndexError>;
