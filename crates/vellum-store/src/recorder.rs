use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};
use vellum_types::{ArtifactDraft, VersionId};

use crate::error::{StoreError, StoreResult};
use crate::traits::VersionLog;

/// Default bound on a single backend call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Ingestion front door: validates a draft, then appends it under a timeout.
///
/// A draft that fails validation never reaches the log. A timed-out append
/// surfaces as [`StoreError::Timeout`] and is treated like any other backend
/// failure; there is no retry.
#[derive(Clone)]
pub struct Recorder {
    log: Arc<dyn VersionLog>,
    timeout: Duration,
}

impl Recorder {
    pub fn new(log: Arc<dyn VersionLog>) -> Self {
        Self::with_timeout(log, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(log: Arc<dyn VersionLog>, timeout: Duration) -> Self {
        Self { log, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn record(&self, draft: ArtifactDraft) -> StoreResult<VersionId> {
        let path = draft.validate()?;

        match tokio::time::timeout(self.timeout, self.log.append(draft)).await {
            Ok(Ok(id)) => {
                debug!(path = %path, id = %id, "version recorded");
                Ok(id)
            }
            Ok(Err(e)) => {
                warn!(path = %path, error = %e, "append failed");
                Err(e)
            }
            Err(_) => {
                warn!(path = %path, timeout = ?self.timeout, "append timed out");
                Err(StoreError::Timeout(self.timeout))
            }
        }
    }
}

impl std::fmt::Debug for Recorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recorder")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::memory::InMemoryVersionLog;
    use crate::traits::VersionReader;

    fn draft(path: &str, version: &str) -> ArtifactDraft {
        ArtifactDraft::new(
            path,
            b"body".to_vec(),
            version,
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        )
    }

    /// Counts appends and never finishes them.
    #[derive(Default)]
    struct StalledLog {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl VersionLog for StalledLog {
        async fn append(&self, _draft: ArtifactDraft) -> StoreResult<VersionId> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::future::pending().await
        }
    }

    struct RefusingLog;

    #[async_trait]
    impl VersionLog for RefusingLog {
        async fn append(&self, _draft: ArtifactDraft) -> StoreResult<VersionId> {
            Err(StoreError::Connection("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn records_into_the_log() {
        let log = Arc::new(InMemoryVersionLog::new());
        let recorder = Recorder::new(log.clone());

        let id = recorder.record(draft("index.html", "c1")).await.unwrap();
        assert_eq!(log.latest_for("index.html").await.unwrap().unwrap().id(), id);
    }

    #[tokio::test]
    async fn invalid_draft_never_reaches_the_log() {
        let log = Arc::new(StalledLog::default());
        let recorder = Recorder::new(log.clone());

        let err = recorder.record(draft("/etc/passwd", "c1")).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        let err = recorder.record(draft("a.txt", "  ")).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(log.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_append_times_out() {
        let log = Arc::new(StalledLog::default());
        let recorder = Recorder::with_timeout(log.clone(), Duration::from_millis(100));

        let err = recorder.record(draft("a.txt", "c1")).await.unwrap_err();
        assert!(matches!(err, StoreError::Timeout(d) if d == Duration::from_millis(100)));
        assert!(err.is_connection());
        assert_eq!(log.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn backend_failure_is_passed_through() {
        let recorder = Recorder::new(Arc::new(RefusingLog));
        let err = recorder.record(draft("a.txt", "c1")).await.unwrap_err();
        assert!(matches!(err, StoreError::Connection(_)));
    }
}
