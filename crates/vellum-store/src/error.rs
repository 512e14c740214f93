use std::time::Duration;

use vellum_types::{ValidationError, VersionId};

/// Errors from version log operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Required ingestion fields were missing or malformed.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The storage backend could not be reached.
    #[error("backend unavailable: {0}")]
    Connection(String),

    /// A backend call did not complete in time.
    #[error("backend call timed out after {0:?}")]
    Timeout(Duration),

    /// A record could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A lock guarding backend state was poisoned by a panicking writer.
    #[error("{0} lock poisoned")]
    Poisoned(&'static str),

    /// The blocking task running backend I/O panicked or was cancelled.
    #[error("backend task failed: {0}")]
    Task(String),

    /// An append was written but could not be read back from the log.
    #[error("appended version {0} is not readable from the log")]
    Unindexed(VersionId),
}

impl StoreError {
    /// `true` for every failure that means "backend trouble" rather than bad
    /// input. Callers treat these as a version not recorded / not resolved.
    pub fn is_connection(&self) -> bool {
        !matches!(self, Self::Validation(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// A latest-version lookup that could not be answered.
///
/// Readers degrade on this (empty page, generic 500) rather than crash.
#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    #[error("resolution failed: {0}")]
    Backend(#[from] StoreError),

    #[error("resolution timed out after {0:?}")]
    TimedOut(Duration),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_is_not_a_connection_failure() {
        let err = StoreError::from(ValidationError::EmptyPath);
        assert!(!err.is_connection());
        assert_eq!(err.to_string(), "validation error: artifact path is empty");
    }

    #[test]
    fn backend_failures_are_connection_failures() {
        assert!(StoreError::Connection("refused".into()).is_connection());
        assert!(StoreError::Timeout(Duration::from_secs(1)).is_connection());
        assert!(StoreError::Poisoned("index").is_connection());
        assert!(StoreError::Task("cancelled".into()).is_connection());
        assert!(StoreError::Unindexed(VersionId::new()).is_connection());
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        assert!(StoreError::from(io).is_connection());
    }

    #[test]
    fn resolution_error_keeps_backend_detail() {
        let err = ResolutionError::from(StoreError::Connection("refused".into()));
        assert_eq!(err.to_string(), "resolution failed: backend unavailable: refused");
        let err = ResolutionError::TimedOut(Duration::from_millis(250));
        assert_eq!(err.to_string(), "resolution timed out after 250ms");
    }
}
