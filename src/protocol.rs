//! JSON request and response shapes exchanged with the calling service.

use std::borrow::Cow;
use std::fmt::Display;

use facematch_engine::{
    Candidate, CandidateError, CandidateRecord, ComparisonResult, Embedding, MatchOutcome,
    SearchReport, SkippedCandidate,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const NO_MATCH_MESSAGE: &str = "No matching face found";

#[derive(Error, Debug)]
pub enum RequestError {
    #[error("Invalid JSON input: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Invalid input format. Expected 'input_embedding' with 'stored_embedding' or 'stored_faces'")]
    InvalidShape,
}

/// One request, in either of the two call modes.
///
/// When both `stored_embedding` and `stored_faces` are present the request is
/// treated as a comparison.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Request {
    Compare {
        #[serde(alias = "input_descriptor")]
        input_embedding: Vec<f64>,
        stored_embedding: Vec<f64>,
        #[serde(default)]
        threshold: Option<f32>,
        #[serde(default)]
        l2_normalize: Option<bool>,
    },
    Search {
        #[serde(alias = "input_descriptor")]
        input_embedding: Vec<f64>,
        stored_faces: Vec<StoredFace>,
        #[serde(default)]
        threshold: Option<f32>,
        #[serde(default)]
        l2_normalize: Option<bool>,
    },
}

impl Request {
    /// Parse raw request bytes. Invalid UTF-8 is reported like any other
    /// malformed JSON.
    pub fn parse(raw: &[u8]) -> Result<Self, RequestError> {
        let value: Value = serde_json::from_slice(raw)?;
        Request::deserialize(value).map_err(|_| RequestError::InvalidShape)
    }

    pub fn threshold(&self) -> Option<f32> {
        match self {
            Request::Compare { threshold, .. } | Request::Search { threshold, .. } => *threshold,
        }
    }

    pub fn l2_normalize(&self) -> Option<bool> {
        match self {
            Request::Compare { l2_normalize, .. } | Request::Search { l2_normalize, .. } => {
                *l2_normalize
            }
        }
    }
}

/// A `stored_faces` entry, kept as raw JSON until the search resolves it so
/// that one bad entry only drops that entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct StoredFace(pub Value);

#[derive(Debug, Deserialize)]
struct FaceEntry {
    face_descriptor: Descriptor,
    employee_id: Value,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    employee_name: Option<String>,
    #[serde(default)]
    position: Option<String>,
    #[serde(default)]
    department: Option<String>,
    #[serde(default)]
    employee_code: Option<String>,
}

/// Descriptors are normally JSON text, but an inline array is accepted too
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Descriptor {
    Text(String),
    Values(Vec<f64>),
}

/// Identity attached to a stored face
#[derive(Debug, Clone, PartialEq)]
pub struct Employee {
    /// Passed through untouched; may be a number or a string
    pub employee_id: Value,
    pub full_name: String,
    pub position: Option<String>,
    pub department: Option<String>,
    pub employee_code: Option<String>,
}

impl Candidate for StoredFace {
    type Meta = Employee;

    fn resolve(&self) -> Result<Cow<'_, CandidateRecord<Employee>>, CandidateError> {
        let entry =
            FaceEntry::deserialize(&self.0).map_err(|e| CandidateError::Malformed(e.to_string()))?;
        // `full_name` wins when both are present
        let full_name = entry
            .full_name
            .or(entry.employee_name)
            .ok_or_else(|| CandidateError::Malformed("missing field `full_name`".to_string()))?;
        let embedding = match &entry.face_descriptor {
            Descriptor::Text(text) => Embedding::parse_descriptor(text),
            Descriptor::Values(values) => Embedding::from_f64(values),
        }
        .map_err(|e| CandidateError::Malformed(e.to_string()))?;

        Ok(Cow::Owned(CandidateRecord {
            embedding,
            meta: Employee {
                employee_id: entry.employee_id,
                full_name,
                position: entry.position,
                department: entry.department,
                employee_code: entry.employee_code,
            },
        }))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Response {
    pub success: bool,
    #[serde(flatten)]
    pub body: ResponseBody,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Comparison {
        similarity: f32,
        is_match: bool,
        distance: f32,
        euclidean_similarity: f32,
        threshold: f32,
    },
    Match {
        #[serde(rename = "match")]
        matched: MatchedEmployee,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        skipped: Vec<SkippedCandidate>,
    },
    NoMatch {
        message: String,
        highest_similarity: f32,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        skipped: Vec<SkippedCandidate>,
    },
    Error {
        error: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchedEmployee {
    pub employee_id: Value,
    pub employee_name: String,
    pub position: String,
    pub department: String,
    pub employee_code: String,
    pub similarity: f32,
    pub distance: f32,
}

impl Response {
    pub fn comparison(result: &ComparisonResult) -> Self {
        Self {
            success: true,
            body: ResponseBody::Comparison {
                similarity: result.similarity,
                is_match: result.is_match,
                distance: result.distance,
                euclidean_similarity: result.euclidean_similarity,
                threshold: result.threshold,
            },
        }
    }

    pub fn search(report: SearchReport<Employee>) -> Self {
        let SearchReport { outcome, skipped } = report;
        match outcome {
            MatchOutcome::Found { record, result } => {
                let employee = record.meta;
                Self {
                    success: true,
                    body: ResponseBody::Match {
                        matched: MatchedEmployee {
                            employee_id: employee.employee_id,
                            employee_name: employee.full_name,
                            position: employee.position.unwrap_or_default(),
                            department: employee.department.unwrap_or_default(),
                            employee_code: employee.employee_code.unwrap_or_default(),
                            similarity: result.similarity,
                            distance: result.distance,
                        },
                        skipped,
                    },
                }
            }
            not_found @ MatchOutcome::NotFound { .. } => Self {
                success: false,
                body: ResponseBody::NoMatch {
                    message: NO_MATCH_MESSAGE.to_string(),
                    highest_similarity: not_found.highest_similarity(),
                    skipped,
                },
            },
        }
    }

    pub fn error(err: impl Display) -> Self {
        Self {
            success: false,
            body: ResponseBody::Error {
                error: err.to_string(),
            },
        }
    }
}
