use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use vellum_types::{ArtifactDraft, ArtifactVersion, Recency, VersionId};

use crate::clock::{Clock, SystemClock};
use crate::error::{StoreError, StoreResult};
use crate::index::{Indexed, VersionIndex};
use crate::traits::{VersionLog, VersionReader};

/// Header size: 4 bytes length + 4 bytes CRC.
const HEADER_SIZE: usize = 8;

/// Flush strategy for appends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncMode {
    /// `fsync` after every append.
    EveryWrite,
    /// Hand the bytes to the OS and rely on its page cache.
    #[default]
    OsDefault,
}

/// Durable, append-only version log backed by a single segment file.
///
/// On-disk format, one frame per version:
/// ```text
/// [4 bytes: payload length (little-endian u32)]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload (bincode-serialized ArtifactVersion)]
/// ```
///
/// Each frame is written with a single `write_all` on a file opened in
/// append mode, so several processes (an ingestion run and a server) can
/// share one segment. Before every read the log tails frames appended since
/// its last read. Frames failing the CRC check are skipped; an incomplete
/// frame at the end is left for a later read to pick up, and cut off when
/// the segment is next opened.
///
/// Only frame locations are held in memory. Content is read back from the
/// segment when a version is resolved. All segment I/O runs on tokio's
/// blocking pool, so callers can bound it with a timeout.
pub struct FileVersionLog {
    segment: Arc<Segment>,
    clock: Arc<dyn Clock>,
}

struct Segment {
    path: PathBuf,
    sync_mode: SyncMode,
    writer: Mutex<File>,
    tail: RwLock<TailState>,
}

/// Everything indexed so far plus how many bytes of the segment that covers.
#[derive(Default)]
struct TailState {
    offset: u64,
    index: VersionIndex<FrameRef>,
}

/// Where a version's payload lives in the segment.
#[derive(Clone, Debug)]
struct FrameRef {
    id: VersionId,
    path: String,
    recency: Recency,
    /// Offset of the payload, just past the frame header.
    offset: u64,
    len: u32,
    crc: u32,
}

impl FrameRef {
    fn new(version: &ArtifactVersion, offset: u64, len: u32, crc: u32) -> Self {
        Self {
            id: version.id(),
            path: version.path().as_str().to_string(),
            recency: version.recency(),
            offset,
            len,
            crc,
        }
    }
}

impl Indexed for FrameRef {
    fn id(&self) -> VersionId {
        self.id
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn recency(&self) -> Recency {
        self.recency
    }
}

impl FileVersionLog {
    /// Open (or create) a segment file and index every record already in it.
    ///
    /// A partial frame left at the end by a writer that died mid-append is
    /// truncated away, so the next append lands on a frame boundary.
    pub fn open(path: impl AsRef<Path>, sync_mode: SyncMode) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        let segment = Segment {
            path: path.to_path_buf(),
            sync_mode,
            writer: Mutex::new(file),
            tail: RwLock::new(TailState::default()),
        };
        segment.refresh()?;
        segment.truncate_torn_tail()?;

        let log = Self {
            segment: Arc::new(segment),
            clock: Arc::new(SystemClock),
        };
        debug!(path = %log.segment.path.display(), versions = log.len(), "version log opened");
        Ok(log)
    }

    /// Replace the clock that stamps `recorded_at`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn path(&self) -> &Path {
        &self.segment.path
    }

    /// Number of versions indexed.
    pub fn len(&self) -> usize {
        self.segment.tail.read().map(|t| t.index.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes of the segment covered by the index.
    pub fn indexed_offset(&self) -> u64 {
        self.segment.tail.read().map(|t| t.offset).unwrap_or(0)
    }

    /// Index any frames appended to the segment since the last call.
    ///
    /// Blocks on file I/O; async callers go through the trait methods.
    pub fn refresh(&self) -> StoreResult<()> {
        self.segment.refresh()
    }

    /// Run `f` against the segment on the blocking pool.
    async fn blocking<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Segment) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let segment = Arc::clone(&self.segment);
        tokio::task::spawn_blocking(move || f(&segment))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

impl Segment {
    fn refresh(&self) -> StoreResult<()> {
        let file_len = fs::metadata(&self.path)?.len();
        if file_len == self.read_tail()?.offset {
            return Ok(());
        }

        let mut tail = self.tail.write().map_err(|_| StoreError::Poisoned("tail"))?;
        if file_len < tail.offset {
            warn!(
                path = %self.path.display(),
                file_len,
                indexed = tail.offset,
                "segment shrank below indexed offset; ignoring"
            );
            return Ok(());
        }
        if file_len == tail.offset {
            return Ok(());
        }

        let mut reader = BufReader::new(File::open(&self.path)?);
        reader.seek(SeekFrom::Start(tail.offset))?;

        let mut offset = tail.offset;
        let mut header = [0u8; HEADER_SIZE];
        let mut payload = Vec::new();
        let mut recovered = 0usize;
        while file_len - offset >= HEADER_SIZE as u64 {
            reader.read_exact(&mut header)?;
            let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
            let expected_crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

            if length == 0 {
                warn!(offset, "zero-length frame; stopping");
                break;
            }
            let frame_len = HEADER_SIZE as u64 + u64::from(length);
            if frame_len > file_len - offset {
                debug!(offset, "incomplete frame at tail; deferring");
                break;
            }

            payload.resize(length as usize, 0);
            reader.read_exact(&mut payload)?;
            let frame_start = offset;
            offset += frame_len;

            let actual_crc = crc32fast::hash(&payload);
            if actual_crc != expected_crc {
                warn!(
                    offset = frame_start,
                    expected = expected_crc,
                    actual = actual_crc,
                    "CRC mismatch; skipping frame"
                );
                continue;
            }

            match bincode::deserialize::<ArtifactVersion>(&payload) {
                Ok(version) => {
                    let frame = FrameRef::new(
                        &version,
                        frame_start + HEADER_SIZE as u64,
                        length,
                        actual_crc,
                    );
                    if tail.index.insert(frame) {
                        recovered += 1;
                    }
                }
                Err(e) => {
                    warn!(offset = frame_start, error = %e, "undecodable frame; skipping");
                }
            }
        }

        tail.offset = offset;
        if recovered > 0 {
            debug!(recovered, offset = tail.offset, "indexed new frames");
        }
        Ok(())
    }

    /// Cut the segment back to the last complete frame.
    fn truncate_torn_tail(&self) -> StoreResult<()> {
        let writer = self.writer.lock().map_err(|_| StoreError::Poisoned("writer"))?;
        self.refresh()?;
        let indexed = self.read_tail()?.offset;
        let file_len = writer.metadata()?.len();
        if file_len > indexed {
            warn!(
                path = %self.path.display(),
                file_len,
                indexed,
                "truncating incomplete frame at segment tail"
            );
            writer.set_len(indexed)?;
            writer.sync_all()?;
        }
        Ok(())
    }

    fn append(&self, id: VersionId, frame: &[u8]) -> StoreResult<()> {
        {
            let mut file = self.writer.lock().map_err(|_| StoreError::Poisoned("writer"))?;
            file.write_all(frame)?;
            match self.sync_mode {
                SyncMode::EveryWrite => file.sync_data()?,
                SyncMode::OsDefault => file.flush()?,
            }
        }

        self.refresh()?;
        if !self.read_tail()?.index.contains(id) {
            warn!(path = %self.path.display(), id = %id, "appended frame not indexed");
            return Err(StoreError::Unindexed(id));
        }
        Ok(())
    }

    fn read_tail(&self) -> StoreResult<RwLockReadGuard<'_, TailState>> {
        self.tail.read().map_err(|_| StoreError::Poisoned("tail"))
    }

    /// Refresh, then read frame locations from the index.
    fn frames<T>(&self, f: impl FnOnce(&VersionIndex<FrameRef>) -> T) -> StoreResult<T> {
        self.refresh()?;
        Ok(f(&self.read_tail()?.index))
    }

    fn load_all(&self, frames: impl IntoIterator<Item = FrameRef>) -> StoreResult<Vec<ArtifactVersion>> {
        let mut file = File::open(&self.path)?;
        frames
            .into_iter()
            .map(|frame| read_frame(&mut file, &frame))
            .collect()
    }

    fn latest_for(&self, path: &str) -> StoreResult<Option<ArtifactVersion>> {
        let Some(frame) = self.frames(|index| index.latest_for(path).cloned())? else {
            return Ok(None);
        };
        Ok(self.load_all([frame])?.pop())
    }

    fn history(&self, path: &str) -> StoreResult<Vec<ArtifactVersion>> {
        let frames = self.frames(|index| index.history(path))?;
        self.load_all(frames)
    }

    fn latest_for_all(&self) -> StoreResult<BTreeMap<String, ArtifactVersion>> {
        let frames = self.frames(|index| index.latest_for_all())?;
        let paths: Vec<String> = frames.keys().cloned().collect();
        let versions = self.load_all(frames.into_values())?;
        Ok(paths.into_iter().zip(versions).collect())
    }
}

/// Read one payload back and check it against the frame it was indexed from.
fn read_frame(file: &mut File, frame: &FrameRef) -> StoreResult<ArtifactVersion> {
    file.seek(SeekFrom::Start(frame.offset))?;
    let mut payload = vec![0u8; frame.len as usize];
    file.read_exact(&mut payload)?;

    if crc32fast::hash(&payload) != frame.crc {
        return Err(StoreError::Serialization(format!(
            "checksum mismatch reading version {} at offset {}",
            frame.id, frame.offset
        )));
    }
    let version: ArtifactVersion =
        bincode::deserialize(&payload).map_err(|e| StoreError::Serialization(e.to_string()))?;
    if version.id() != frame.id {
        return Err(StoreError::Serialization(format!(
            "frame at offset {} holds version {}, expected {}",
            frame.offset,
            version.id(),
            frame.id
        )));
    }
    Ok(version)
}

fn encode_frame(version: &ArtifactVersion) -> StoreResult<Vec<u8>> {
    let payload =
        bincode::serialize(version).map_err(|e| StoreError::Serialization(e.to_string()))?;
    let length = u32::try_from(payload.len())
        .map_err(|_| StoreError::Serialization(format!("record too large: {} bytes", payload.len())))?;

    let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
    frame.extend_from_slice(&length.to_le_bytes());
    frame.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

#[async_trait]
impl VersionLog for FileVersionLog {
    async fn append(&self, draft: ArtifactDraft) -> StoreResult<VersionId> {
        let version = draft.into_version(VersionId::new(), self.clock.now())?;
        let id = version.id();
        let frame = encode_frame(&version)?;
        let bytes = frame.len();

        self.blocking(move |segment| segment.append(id, &frame)).await?;
        debug!(path = %version.path(), version = version.version(), id = %id, bytes, "append");
        Ok(id)
    }
}

#[async_trait]
impl VersionReader for FileVersionLog {
    async fn latest_for(&self, path: &str) -> StoreResult<Option<ArtifactVersion>> {
        let path = path.to_string();
        self.blocking(move |segment| segment.latest_for(&path)).await
    }

    async fn all_known_paths(&self) -> StoreResult<BTreeSet<String>> {
        self.blocking(|segment| segment.frames(|index| index.paths())).await
    }

    async fn history(&self, path: &str) -> StoreResult<Vec<ArtifactVersion>> {
        let path = path.to_string();
        self.blocking(move |segment| segment.history(&path)).await
    }

    async fn latest_for_all(&self) -> StoreResult<BTreeMap<String, ArtifactVersion>> {
        self.blocking(|segment| segment.latest_for_all()).await
    }
}

impl std::fmt::Debug for FileVersionLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileVersionLog")
            .field("path", &self.segment.path)
            .field("sync_mode", &self.segment.sync_mode)
            .field("version_count", &self.len())
            .finish()
    }
}
