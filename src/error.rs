//! Error types for the detection engine.

use thiserror::Error;

/// A specialized `Result` type for analysis operations.
pub type Result<T> = std::result::Result<T, AnalyzeError>;

/// Errors surfaced by the ingest and analysis pipeline.
///
/// `MissingColumns`, `Csv`, `Timestamp` and `Amount` describe malformed
/// input and map to 4xx at the API boundary. `TooLarge` is resource
/// exhaustion (413). `Invariant` is a programmer error and maps to 500.
/// Detector timeouts and caps are not errors; they produce partial results.
#[derive(Error, Debug)]
pub enum AnalyzeError {
    /// The CSV header lacks one or more required columns.
    #[error("missing required columns: {0}")]
    MissingColumns(String),

    /// The CSV body could not be parsed.
    #[error("CSV parse error: {0}")]
    Csv(String),

    /// A timestamp field was not RFC 3339 or `YYYY-MM-DD HH:MM:SS`.
    #[error("invalid timestamp {0:?}: expected RFC 3339 or YYYY-MM-DD HH:MM:SS")]
    Timestamp(String),

    /// An amount field was not a number.
    #[error("invalid amount {0:?}")]
    Amount(String),

    /// The multipart upload did not include a `file` field.
    #[error("multipart upload missing the `file` field")]
    MissingFile,

    /// The upload exceeded the configured byte limit.
    #[error("upload exceeds the {limit}-byte limit")]
    TooLarge { limit: usize },

    /// The configuration file was unreadable or invalid. Surfaces at
    /// startup, never through the HTTP boundary.
    #[error("configuration error: {0}")]
    Config(String),

    /// An internal invariant was violated; the request fails as a 500.
    #[error("internal invariant violated: {0}")]
    Invariant(String),
}

impl From<csv::Error> for AnalyzeError {
    fn from(e: csv::Error) -> Self {
        AnalyzeError::Csv(e.to_string())
    }
}
