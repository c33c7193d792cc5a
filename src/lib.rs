pub mod config;
pub mod matcher;
pub mod protocol;

// Re-export engine types for convenience
pub use facematch_engine::{
    compare, compare_with, find_best_match, find_best_match_with, CandidateRecord,
    CompareOptions, ComparisonResult, Embedding, MatchOutcome, Metric,
};
