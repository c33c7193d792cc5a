use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::embedding::Embedding;
use crate::error::CompareError;

pub const DEFAULT_THRESHOLD: f32 = 0.6;

/// Vectors whose norm is within this of 1.0 are treated as already unit length
const UNIT_NORM_TOLERANCE: f64 = 0.1;

/// Metric that drives the match decision
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Cosine similarity of the two vectors
    #[default]
    Cosine,
    /// `1 - distance / sqrt(dim)`, the older Euclidean-only scoring
    Euclidean,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompareOptions {
    pub metric: Metric,
    /// Scale both vectors to unit length before measuring distance, unless
    /// both already are (norm within 0.1 of 1.0). Zero vectors stay zero.
    pub l2_normalize: bool,
}

/// Outcome of comparing one embedding against another
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComparisonResult {
    /// Primary score, produced by `metric`
    pub similarity: f32,
    /// L2 distance between the two vectors
    pub distance: f32,
    /// `1 - distance / sqrt(2)` clamped to [0, 1]; only meaningful for unit vectors
    pub euclidean_similarity: f32,
    pub is_match: bool,
    pub threshold: f32,
    pub metric: Metric,
}

/// Compare two embeddings using cosine similarity as the primary metric.
///
/// The threshold is used as given. Values outside [0, 1] are not rejected.
pub fn compare(
    input: &Embedding,
    stored: &Embedding,
    threshold: f32,
) -> Result<ComparisonResult, CompareError> {
    compare_with(input, stored, threshold, CompareOptions::default())
}

pub fn compare_with(
    input: &Embedding,
    stored: &Embedding,
    threshold: f32,
    options: CompareOptions,
) -> Result<ComparisonResult, CompareError> {
    if input.dim() != stored.dim() {
        return Err(CompareError::DimensionMismatch {
            expected: input.dim(),
            actual: stored.dim(),
        });
    }

    let (a, b) = prepare(input.as_slice(), stored.as_slice(), options.l2_normalize);

    let cosine = cosine_similarity(&a, &b);
    let distance = euclidean_distance(&a, &b);
    let euclidean_similarity = (1.0 - distance / std::f64::consts::SQRT_2).clamp(0.0, 1.0);

    let similarity = match options.metric {
        Metric::Cosine => cosine,
        Metric::Euclidean => 1.0 - distance / (a.len() as f64).sqrt(),
    };
    let similarity = similarity as f32;

    Ok(ComparisonResult {
        similarity,
        distance: distance as f32,
        euclidean_similarity: euclidean_similarity as f32,
        is_match: similarity >= threshold,
        threshold,
        metric: options.metric,
    })
}

fn prepare<'a>(a: &'a [f32], b: &'a [f32], l2_normalize: bool) -> (Cow<'a, [f32]>, Cow<'a, [f32]>) {
    if !l2_normalize {
        return (Cow::Borrowed(a), Cow::Borrowed(b));
    }
    let norm_a = dot_self(a).sqrt();
    let norm_b = dot_self(b).sqrt();
    let is_unit = |n: f64| (n - 1.0).abs() < UNIT_NORM_TOLERANCE;
    if is_unit(norm_a) && is_unit(norm_b) {
        return (Cow::Borrowed(a), Cow::Borrowed(b));
    }
    (normalized(a, norm_a), normalized(b, norm_b))
}

fn normalized(v: &[f32], norm: f64) -> Cow<'_, [f32]> {
    if norm == 0.0 {
        return Cow::Borrowed(v);
    }
    Cow::Owned(v.iter().map(|&x| (x as f64 / norm) as f32).collect())
}

/// Cosine similarity in [-1, 1]; 0.0 when either vector has zero norm.
///
/// The denominator is `sqrt(|a|^2 * |b|^2)` so that `a` against itself is
/// exactly 1.0 and swapping the arguments gives the same bits.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let dot = dot(a, b);
    let norm_a = dot_self(a);
    let norm_b = dot_self(b);

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a * norm_b).sqrt()).clamp(-1.0, 1.0)
}

pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = x as f64 - y as f64;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter().zip(b).map(|(&x, &y)| x as f64 * y as f64).sum()
}

fn dot_self(a: &[f32]) -> f64 {
    dot(a, a)
}
