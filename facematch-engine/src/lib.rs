pub mod embedding;
pub mod error;
pub mod metric;
pub mod search;

// Re-export commonly used types
pub use embedding::Embedding;
pub use error::{CandidateError, CompareError};
pub use metric::{
    compare, compare_with, CompareOptions, ComparisonResult, Metric, DEFAULT_THRESHOLD,
};
pub use search::{
    find_best_match, find_best_match_with, Candidate, CandidateRecord, MatchOutcome,
    SearchReport, SkippedCandidate,
};
