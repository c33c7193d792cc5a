use ndarray::Array1;

use crate::error::CompareError;

/// Face embedding, validated on construction.
///
/// Every value is finite and there is at least one dimension, so metric code
/// never has to deal with NaN or infinity.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    vector: Array1<f32>,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Result<Self, CompareError> {
        if values.is_empty() {
            return Err(CompareError::InvalidEmbedding(
                "embedding has no dimensions".to_string(),
            ));
        }
        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(CompareError::InvalidEmbedding(format!(
                "non-finite value {} at index {}",
                values[pos], pos
            )));
        }
        Ok(Self {
            vector: Array1::from_vec(values),
        })
    }

    /// Build from `f64` values as they come out of JSON. Values that overflow
    /// `f32` become infinite and are rejected. Values too small for `f32`
    /// flush to zero, same as a float32 cast, so a vector made only of such
    /// values ends up with zero norm.
    pub fn from_f64(values: &[f64]) -> Result<Self, CompareError> {
        Self::new(values.iter().map(|&v| v as f32).collect())
    }

    /// Parse a descriptor stored as JSON text, e.g. `"[0.12, -0.4, ...]"`
    pub fn parse_descriptor(text: &str) -> Result<Self, CompareError> {
        let values: Vec<f64> = serde_json::from_str(text)
            .map_err(|e| CompareError::InvalidEmbedding(format!("unparseable descriptor: {e}")))?;
        Self::from_f64(&values)
    }

    pub fn dim(&self) -> usize {
        self.vector.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        // Array1 built from a Vec is always contiguous
        self.vector.as_slice().unwrap_or(&[])
    }
}
