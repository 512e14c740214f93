use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::digest::ContentDigest;
use crate::error::ValidationError;
use crate::id::VersionId;
use crate::path::ArtifactPath;

/// Ingestion input: everything a caller supplies for one append.
///
/// The log assigns the [`VersionId`] and stamps `recorded_at` itself, so
/// neither appears here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactDraft {
    pub path: String,
    pub content: Vec<u8>,
    pub version: String,
    pub source_timestamp: DateTime<Utc>,
}

impl ArtifactDraft {
    pub fn new(
        path: impl Into<String>,
        content: impl Into<Vec<u8>>,
        version: impl Into<String>,
        source_timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            version: version.into(),
            source_timestamp,
        }
    }

    /// Check required fields without consuming the draft.
    pub fn validate(&self) -> Result<ArtifactPath, ValidationError> {
        let path = ArtifactPath::new(self.path.as_str())?;
        if self.version.trim().is_empty() {
            return Err(ValidationError::EmptyVersion);
        }
        Ok(path)
    }

    /// Seal the draft into an immutable version.
    pub fn into_version(
        self,
        id: VersionId,
        recorded_at: DateTime<Utc>,
    ) -> Result<ArtifactVersion, ValidationError> {
        let path = self.validate()?;
        let filename = path.file_name().to_string();
        Ok(ArtifactVersion {
            id,
            path,
            filename,
            content: self.content,
            version: self.version.trim().to_string(),
            source_timestamp: self.source_timestamp,
            recorded_at,
        })
    }
}

/// One immutable recorded state of an artifact.
///
/// Fields are private: once sealed by [`ArtifactDraft::into_version`] a
/// version can only be read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactVersion {
    id: VersionId,
    path: ArtifactPath,
    filename: String,
    content: Vec<u8>,
    version: String,
    source_timestamp: DateTime<Utc>,
    recorded_at: DateTime<Utc>,
}

impl ArtifactVersion {
    pub fn id(&self) -> VersionId {
        self.id
    }

    pub fn path(&self) -> &ArtifactPath {
        &self.path
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Content decoded as UTF-8, with invalid sequences replaced.
    pub fn content_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn source_timestamp(&self) -> DateTime<Utc> {
        self.source_timestamp
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    pub fn digest(&self) -> ContentDigest {
        ContentDigest::of(&self.content)
    }

    /// Ordering key used to pick the current version of a path.
    pub fn recency(&self) -> Recency {
        Recency {
            source_timestamp: self.source_timestamp,
            recorded_at: self.recorded_at,
            id: self.id,
        }
    }

    /// Returns `true` if `self` should replace `other` as the current version.
    pub fn supersedes(&self, other: &ArtifactVersion) -> bool {
        self.recency() > other.recency()
    }
}

/// Total order over versions of one path.
///
/// Compared field by field: `source_timestamp` first, then `recorded_at`,
/// then `id`. The greatest key is the current version. Arrival order and
/// storage iteration order never take part.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Recency {
    pub source_timestamp: DateTime<Utc>,
    pub recorded_at: DateTime<Utc>,
    pub id: VersionId,
}
