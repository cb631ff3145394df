//! Error types for the quality gate.
//!
//! Artifact and insight failures are recoverable; validation failures abort
//! the run before anything is written.

use std::path::PathBuf;
use thiserror::Error;

/// A report artifact could not be read or understood.
#[derive(Error, Debug)]
pub enum ArtifactParseError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed XML in {origin}: {source}")]
    Xml {
        origin: String,
        #[source]
        source: roxmltree::Error,
    },

    #[error("attribute `{attribute}` in {origin} is not a valid number: {value:?}")]
    Attribute {
        origin: String,
        attribute: &'static str,
        value: String,
    },
}

/// Canonical metrics violated their numeric constraints.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("test count `{field}` must be non-negative, got {value}")]
    NegativeCount { field: &'static str, value: i64 },

    #[error(
        "test counts are inconsistent: passed ({passed}) + failed ({failed}) != total ({total})"
    )]
    InconsistentCounts { total: u64, passed: u64, failed: u64 },

    #[error("`{field}` must be a percentage in [0, 100], got {value}")]
    PercentOutOfRange { field: &'static str, value: f64 },
}

#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error(transparent)]
    Artifact(#[from] ArtifactParseError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Failures while producing the optional AI narrative. None of these are
/// fatal to the gate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InsightError {
    #[error("provider returned an empty response")]
    EmptyResponse,

    #[error("response is not valid JSON ({detail})\nRaw response:\n{raw}")]
    MalformedInsight { raw: String, detail: String },

    #[error("response does not match the insight schema: {0}")]
    SchemaViolation(String),

    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("provider did not answer within {0}s")]
    Timeout(u64),

    #[error("failed to encode the decision record for the prompt: {0}")]
    Prompt(String),
}

impl InsightError {
    /// Short stable name for operator diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            InsightError::EmptyResponse => "EmptyResponse",
            InsightError::MalformedInsight { .. } => "MalformedInsight",
            InsightError::SchemaViolation(_) => "SchemaViolation",
            InsightError::ProviderUnavailable(_) => "ProviderUnavailable",
            InsightError::Timeout(_) => "Timeout",
            InsightError::Prompt(_) => "Prompt",
        }
    }
}
