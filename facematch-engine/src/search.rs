use std::borrow::Cow;

use log::{debug, warn};
use serde::Serialize;

use crate::embedding::Embedding;
use crate::error::CandidateError;
use crate::metric::{compare_with, CompareOptions, ComparisonResult};

/// Stored embedding tagged with opaque identity metadata
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRecord<M> {
    pub embedding: Embedding,
    pub meta: M,
}

/// Anything that can be resolved into a [`CandidateRecord`].
///
/// Resolution runs once per candidate during a search and may fail on its own
/// (e.g. a descriptor that does not parse); such a candidate is skipped.
pub trait Candidate {
    type Meta: Clone;

    fn resolve(&self) -> Result<Cow<'_, CandidateRecord<Self::Meta>>, CandidateError>;
}

impl<M: Clone> Candidate for CandidateRecord<M> {
    type Meta = M;

    fn resolve(&self) -> Result<Cow<'_, CandidateRecord<M>>, CandidateError> {
        Ok(Cow::Borrowed(self))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome<M> {
    Found {
        record: CandidateRecord<M>,
        result: ComparisonResult,
    },
    /// `highest_similarity` is `None` when no candidate could be compared
    NotFound { highest_similarity: Option<f32> },
}

impl<M> MatchOutcome<M> {
    pub fn is_found(&self) -> bool {
        matches!(self, MatchOutcome::Found { .. })
    }

    /// Best score seen, 0.0 if nothing was compared
    pub fn highest_similarity(&self) -> f32 {
        match self {
            MatchOutcome::Found { result, .. } => result.similarity,
            MatchOutcome::NotFound { highest_similarity } => highest_similarity.unwrap_or(0.0),
        }
    }
}

/// A candidate left out of the search, by position in the supplied slice
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedCandidate {
    pub index: usize,
    #[serde(serialize_with = "serialize_reason")]
    pub reason: CandidateError,
}

fn serialize_reason<S: serde::Serializer>(reason: &CandidateError, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(reason)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchReport<M> {
    pub outcome: MatchOutcome<M>,
    pub skipped: Vec<SkippedCandidate>,
}

/// Find the candidate most similar to `input` using cosine similarity.
///
/// Every candidate is examined. Among those clearing `threshold`, the highest
/// similarity wins and ties go to the earliest one.
pub fn find_best_match<C: Candidate>(
    input: &Embedding,
    candidates: &[C],
    threshold: f32,
) -> SearchReport<C::Meta> {
    find_best_match_with(input, candidates, threshold, CompareOptions::default())
}

pub fn find_best_match_with<C: Candidate>(
    input: &Embedding,
    candidates: &[C],
    threshold: f32,
    options: CompareOptions,
) -> SearchReport<C::Meta> {
    let mut best: Option<(Cow<'_, CandidateRecord<C::Meta>>, ComparisonResult)> = None;
    let mut highest: Option<f32> = None;
    let mut skipped = Vec::new();

    for (index, candidate) in candidates.iter().enumerate() {
        let scored = candidate.resolve().and_then(|record| {
            let result = compare_with(input, &record.embedding, threshold, options)?;
            Ok((record, result))
        });

        let (record, result) = match scored {
            Ok(x) => x,
            Err(reason) => {
                warn!("Skipping candidate {}: {}", index, reason);
                skipped.push(SkippedCandidate { index, reason });
                continue;
            }
        };

        debug!("Candidate {}: similarity {:.4}", index, result.similarity);

        if highest.map_or(true, |h| result.similarity > h) {
            highest = Some(result.similarity);
        }

        if !result.is_match {
            continue;
        }
        // Strictly greater, so the first of equal candidates is kept
        let improves = match &best {
            Some((_, current)) => result.similarity > current.similarity,
            None => true,
        };
        if improves {
            best = Some((record, result));
        }
    }

    let outcome = match best {
        Some((record, result)) => MatchOutcome::Found {
            record: record.into_owned(),
            result,
        },
        None => MatchOutcome::NotFound {
            highest_similarity: highest,
        },
    };

    SearchReport { outcome, skipped }
}
