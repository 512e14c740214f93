use thiserror::Error;

/// Malformed ingestion input, rejected before it reaches a version log.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("artifact path is empty")]
    EmptyPath,

    #[error("artifact path must be relative: {0}")]
    AbsolutePath(String),

    #[error("artifact path contains an invalid segment: {0}")]
    InvalidSegment(String),

    #[error("version identifier is empty")]
    EmptyVersion,

    #[error("invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp { value: String, reason: String },

    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}
