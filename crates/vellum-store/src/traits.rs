use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use vellum_types::{ArtifactDraft, ArtifactVersion, VersionId};

use crate::error::StoreResult;

/// Write boundary: the append-only version log.
///
/// All implementations must satisfy these invariants:
/// - A record is never updated or deleted once appended.
/// - `recorded_at` and the [`VersionId`] are assigned by the log, not the caller.
/// - Once `append` returns `Ok`, subsequent reads observe the record.
/// - No internal retry: any error means the version was not recorded.
#[async_trait]
pub trait VersionLog: Send + Sync {
    /// Validate and durably append one version.
    async fn append(&self, draft: ArtifactDraft) -> StoreResult<VersionId>;
}

/// Read boundary: latest-version resolution over the log.
///
/// "Latest" is the version with the greatest
/// [`Recency`](vellum_types::Recency) key among those sharing a path.
#[async_trait]
pub trait VersionReader: Send + Sync {
    /// The current version of one path.
    ///
    /// Returns `Ok(None)` if nothing was ever written under `path`.
    async fn latest_for(&self, path: &str) -> StoreResult<Option<ArtifactVersion>>;

    /// Every distinct path ever written.
    async fn all_known_paths(&self) -> StoreResult<BTreeSet<String>>;

    /// Every version of one path, newest first.
    async fn history(&self, path: &str) -> StoreResult<Vec<ArtifactVersion>>;

    /// The current version of every known path.
    ///
    /// Default implementation resolves the path set and then calls
    /// `latest_for()` once per path, which costs one round trip per path.
    /// Backends that can group by path in one pass should override it.
    /// Paths whose lookup comes back empty are omitted.
    async fn latest_for_all(&self) -> StoreResult<BTreeMap<String, ArtifactVersion>> {
        let mut latest = BTreeMap::new();
        for path in self.all_known_paths().await? {
            if let Some(version) = self.latest_for(&path).await? {
                latest.insert(path, version);
            }
        }
        Ok(latest)
    }
}

/// A backend that can both append and resolve.
pub trait VersionStore: VersionLog + VersionReader {}

impl<T: VersionLog + VersionReader + ?Sized> VersionStore for T {}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use chrono::{TimeZone, Utc};

    use super::*;

    /// Reader that only implements the per-path operations, so the default
    /// `latest_for_all` strategy is what gets exercised.
    struct PerPathReader {
        versions: HashMap<String, ArtifactVersion>,
        ghost_paths: Vec<String>,
        lookups: Mutex<usize>,
    }

    #[async_trait]
    impl VersionReader for PerPathReader {
        async fn latest_for(&self, path: &str) -> StoreResult<Option<ArtifactVersion>> {
            *self.lookups.lock().unwrap() += 1;
            Ok(self.versions.get(path).cloned())
        }

        async fn all_known_paths(&self) -> StoreResult<BTreeSet<String>> {
            let mut paths: BTreeSet<String> = self.versions.keys().cloned().collect();
            paths.extend(self.ghost_paths.iter().cloned());
            Ok(paths)
        }

        async fn history(&self, path: &str) -> StoreResult<Vec<ArtifactVersion>> {
            Ok(self.versions.get(path).cloned().into_iter().collect())
        }
    }

    fn version(path: &str) -> ArtifactVersion {
        let ts = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        ArtifactDraft::new(path, b"body".to_vec(), "sha", ts)
            .into_version(VersionId::new(), ts)
            .unwrap()
    }

    #[tokio::test]
    async fn default_latest_for_all_queries_each_path() {
        let mut versions = HashMap::new();
        versions.insert("a.txt".to_string(), version("a.txt"));
        versions.insert("b.txt".to_string(), version("b.txt"));
        let reader = PerPathReader {
            versions,
            ghost_paths: vec!["gone.txt".into()],
            lookups: Mutex::new(0),
        };

        let latest = reader.latest_for_all().await.unwrap();

        assert_eq!(latest.len(), 2);
        assert!(latest.contains_key("a.txt"));
        assert!(latest.contains_key("b.txt"));
        // A known path with no surviving version is skipped, not an error.
        assert!(!latest.contains_key("gone.txt"));
        assert_eq!(*reader.lookups.lock().unwrap(), 3);
    }
}
