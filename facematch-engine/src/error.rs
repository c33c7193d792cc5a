use thiserror::Error;

/// Failure of a single embedding comparison
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompareError {
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid embedding: {0}")]
    InvalidEmbedding(String),
}

/// Why a candidate was left out of a best-match search
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CandidateError {
    #[error("Malformed candidate record: {0}")]
    Malformed(String),

    #[error(transparent)]
    Compare(#[from] CompareError),
}
