use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use vellum_types::{ArtifactVersion, Recency, VersionId};

/// An entry the index can order: anything with an id, a path and a
/// [`Recency`] key.
pub trait Indexed: Clone {
    fn id(&self) -> VersionId;
    fn path(&self) -> &str;
    fn recency(&self) -> Recency;
}

impl Indexed for ArtifactVersion {
    fn id(&self) -> VersionId {
        ArtifactVersion::id(self)
    }

    fn path(&self) -> &str {
        ArtifactVersion::path(self).as_str()
    }

    fn recency(&self) -> Recency {
        ArtifactVersion::recency(self)
    }
}

/// Per-path bookkeeping: every position written under the path plus the
/// position of the current version.
#[derive(Debug)]
struct PathEntry {
    positions: Vec<usize>,
    current: usize,
}

/// In-memory index over an append-only sequence of versions.
///
/// Shared by every backend. The in-memory log indexes whole
/// [`ArtifactVersion`]s; the file log indexes frame locations and loads
/// content on demand. Records are only ever pushed; the current entry per
/// path is maintained on insert by comparing [`Recency`] keys, so arrival
/// order never decides which version is latest.
#[derive(Debug)]
pub struct VersionIndex<T = ArtifactVersion> {
    records: Vec<T>,
    by_path: HashMap<String, PathEntry>,
    ids: HashSet<VersionId>,
}

impl<T> Default for VersionIndex<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            by_path: HashMap::new(),
            ids: HashSet::new(),
        }
    }
}

impl<T: Indexed> VersionIndex<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry. Returns `false` (and changes nothing) if an entry with
    /// the same id is already indexed.
    pub fn insert(&mut self, entry: T) -> bool {
        if !self.ids.insert(entry.id()) {
            return false;
        }

        let position = self.records.len();
        match self.by_path.get_mut(entry.path()) {
            Some(path_entry) => {
                path_entry.positions.push(position);
                if entry.recency() > self.records[path_entry.current].recency() {
                    path_entry.current = position;
                }
            }
            None => {
                self.by_path.insert(
                    entry.path().to_string(),
                    PathEntry {
                        positions: vec![position],
                        current: position,
                    },
                );
            }
        }
        self.records.push(entry);
        true
    }

    pub fn contains(&self, id: VersionId) -> bool {
        self.ids.contains(&id)
    }

    pub fn latest_for(&self, path: &str) -> Option<&T> {
        self.by_path
            .get(path)
            .map(|entry| &self.records[entry.current])
    }

    pub fn paths(&self) -> BTreeSet<String> {
        self.by_path.keys().cloned().collect()
    }

    /// Single pass over the per-path table.
    pub fn latest_for_all(&self) -> BTreeMap<String, T> {
        self.by_path
            .iter()
            .map(|(path, entry)| (path.clone(), self.records[entry.current].clone()))
            .collect()
    }

    /// All entries of `path`, newest first.
    pub fn history(&self, path: &str) -> Vec<T> {
        let Some(entry) = self.by_path.get(path) else {
            return Vec::new();
        };
        let mut entries: Vec<T> = entry
            .positions
            .iter()
            .map(|&p| self.records[p].clone())
            .collect();
        entries.sort_by(|a, b| b.recency().cmp(&a.recency()));
        entries
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn path_count(&self) -> usize {
        self.by_path.len()
    }
}
