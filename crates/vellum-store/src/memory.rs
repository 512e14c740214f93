use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use tracing::debug;
use vellum_types::{ArtifactDraft, ArtifactVersion, VersionId};

use crate::clock::{Clock, SystemClock};
use crate::error::{StoreError, StoreResult};
use crate::index::VersionIndex;
use crate::traits::{VersionLog, VersionReader};

/// In-memory version log.
///
/// Intended for tests and embedding. Versions are held behind a `RwLock`
/// for safe concurrent access and cloned on read.
pub struct InMemoryVersionLog {
    index: RwLock<VersionIndex>,
    clock: Arc<dyn Clock>,
}

impl InMemoryVersionLog {
    /// Create a new empty log stamping with the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            index: RwLock::new(VersionIndex::new()),
            clock,
        }
    }

    /// Number of versions recorded.
    pub fn len(&self) -> usize {
        self.index.read().map(|i| i.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_index(&self) -> StoreResult<RwLockReadGuard<'_, VersionIndex>> {
        self.index.read().map_err(|_| StoreError::Poisoned("index"))
    }

    fn write_index(&self) -> StoreResult<RwLockWriteGuard<'_, VersionIndex>> {
        self.index.write().map_err(|_| StoreError::Poisoned("index"))
    }
}

impl Default for InMemoryVersionLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VersionLog for InMemoryVersionLog {
    async fn append(&self, draft: ArtifactDraft) -> StoreResult<VersionId> {
        let version = draft.into_version(VersionId::new(), self.clock.now())?;
        let id = version.id();
        debug!(path = %version.path(), version = version.version(), id = %id, "append");
        self.write_index()?.insert(version);
        Ok(id)
    }
}

#[async_trait]
impl VersionReader for InMemoryVersionLog {
    async fn latest_for(&self, path: &str) -> StoreResult<Option<ArtifactVersion>> {
        Ok(self.read_index()?.latest_for(path).cloned())
    }

    async fn all_known_paths(&self) -> StoreResult<BTreeSet<String>> {
        Ok(self.read_index()?.paths())
    }

    async fn history(&self, path: &str) -> StoreResult<Vec<ArtifactVersion>> {
        Ok(self.read_index()?.history(path))
    }

    async fn latest_for_all(&self) -> StoreResult<BTreeMap<String, ArtifactVersion>> {
        Ok(self.read_index()?.latest_for_all())
    }
}

impl std::fmt::Debug for InMemoryVersionLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryVersionLog")
            .field("version_count", &self.len())
            .finish()
    }
}
