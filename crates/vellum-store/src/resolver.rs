use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;
use vellum_types::ArtifactVersion;

use crate::error::{ResolutionError, StoreResult};
use crate::recorder::DEFAULT_TIMEOUT;
use crate::traits::VersionReader;

/// Latest-version resolver.
///
/// Wraps a [`VersionReader`] so that every lookup is bounded by a timeout
/// and every failure comes back as a [`ResolutionError`]. Cheap to clone.
#[derive(Clone)]
pub struct Resolver {
    reader: Arc<dyn VersionReader>,
    timeout: Duration,
}

impl Resolver {
    pub fn new(reader: Arc<dyn VersionReader>) -> Self {
        Self::with_timeout(reader, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(reader: Arc<dyn VersionReader>, timeout: Duration) -> Self {
        Self { reader, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn latest_for(&self, path: &str) -> Result<Option<ArtifactVersion>, ResolutionError> {
        self.bounded("latest_for", self.reader.latest_for(path)).await
    }

    pub async fn all_known_paths(&self) -> Result<BTreeSet<String>, ResolutionError> {
        self.bounded("all_known_paths", self.reader.all_known_paths())
            .await
    }

    pub async fn latest_for_all(
        &self,
    ) -> Result<BTreeMap<String, ArtifactVersion>, ResolutionError> {
        self.bounded("latest_for_all", self.reader.latest_for_all())
            .await
    }

    pub async fn history(&self, path: &str) -> Result<Vec<ArtifactVersion>, ResolutionError> {
        self.bounded("history", self.reader.history(path)).await
    }

    async fn bounded<T>(
        &self,
        op: &'static str,
        call: impl Future<Output = StoreResult<T>>,
    ) -> Result<T, ResolutionError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                warn!(op, error = %e, "resolution failed");
                Err(ResolutionError::Backend(e))
            }
            Err(_) => {
                warn!(op, timeout = ?self.timeout, "resolution timed out");
                Err(ResolutionError::TimedOut(self.timeout))
            }
        }
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use vellum_types::ArtifactDraft;

    use super::*;
    use crate::error::StoreError;
    use crate::memory::InMemoryVersionLog;
    use crate::traits::VersionLog;

    struct BrokenReader;

    #[async_trait]
    impl VersionReader for BrokenReader {
        async fn latest_for(&self, _path: &str) -> StoreResult<Option<ArtifactVersion>> {
            Err(StoreError::Connection("no route to host".into()))
        }

        async fn all_known_paths(&self) -> StoreResult<BTreeSet<String>> {
            Err(StoreError::Connection("no route to host".into()))
        }

        async fn history(&self, _path: &str) -> StoreResult<Vec<ArtifactVersion>> {
            Err(StoreError::Connection("no route to host".into()))
        }
    }

    struct SlowReader(Duration);

    #[async_trait]
    impl VersionReader for SlowReader {
        async fn latest_for(&self, _path: &str) -> StoreResult<Option<ArtifactVersion>> {
            tokio::time::sleep(self.0).await;
            Ok(None)
        }

        async fn all_known_paths(&self) -> StoreResult<BTreeSet<String>> {
            tokio::time::sleep(self.0).await;
            Ok(BTreeSet::new())
        }

        async fn history(&self, _path: &str) -> StoreResult<Vec<ArtifactVersion>> {
            tokio::time::sleep(self.0).await;
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn resolves_through_the_reader() {
        let log = Arc::new(InMemoryVersionLog::new());
        let ts = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        log.append(ArtifactDraft::new("a.txt", b"hi".to_vec(), "c1", ts))
            .await
            .unwrap();

        let resolver = Resolver::new(log);
        assert_eq!(
            resolver.latest_for("a.txt").await.unwrap().unwrap().content(),
            b"hi"
        );
        assert!(resolver.latest_for("b.txt").await.unwrap().is_none());
        assert_eq!(resolver.all_known_paths().await.unwrap().len(), 1);
        assert_eq!(resolver.latest_for_all().await.unwrap().len(), 1);
        assert_eq!(resolver.history("a.txt").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn backend_failure_is_a_resolution_error() {
        let resolver = Resolver::new(Arc::new(BrokenReader));
        let err = resolver.latest_for("a.txt").await.unwrap_err();
        assert!(matches!(err, ResolutionError::Backend(StoreError::Connection(_))));
        // The default aggregation fails on the first backend error.
        let err = resolver.latest_for_all().await.unwrap_err();
        assert!(matches!(err, ResolutionError::Backend(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_backend_times_out() {
        let resolver = Resolver::with_timeout(
            Arc::new(SlowReader(Duration::from_secs(30))),
            Duration::from_secs(5),
        );
        let err = resolver.latest_for_all().await.unwrap_err();
        assert!(matches!(err, ResolutionError::TimedOut(d) if d == Duration::from_secs(5)));
    }

    #[tokio::test(start_paused = true)]
    async fn backend_within_the_bound_succeeds() {
        let resolver = Resolver::with_timeout(
            Arc::new(SlowReader(Duration::from_millis(10))),
            Duration::from_secs(5),
        );
        assert!(resolver.history("a.txt").await.unwrap().is_empty());
    }
}
