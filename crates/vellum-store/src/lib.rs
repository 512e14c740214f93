//! Append-only artifact version log for Vellum.
//!
//! Every ingestion event appends one immutable [`ArtifactVersion`]; nothing
//! is ever updated in place. Reads resolve the *latest* version of a path by
//! the greatest [`Recency`] key, so an out-of-order write of an older version
//! never shadows a newer one.
//!
//! # Backends
//!
//! All backends implement [`VersionLog`] (write) and [`VersionReader`] (read):
//!
//! - [`InMemoryVersionLog`] -- `RwLock`-guarded index for tests and embedding
//! - [`FileVersionLog`] -- CRC-framed segment file, shareable across processes
//!
//! # Call boundaries
//!
//! - [`Recorder`] validates drafts and bounds appends with a timeout.
//! - [`Resolver`] bounds reads with a timeout and reports [`ResolutionError`].
//!
//! [`ArtifactVersion`]: vellum_types::ArtifactVersion
//! [`Recency`]: vellum_types::Recency

pub mod clock;
pub mod error;
pub mod file;
pub mod index;
pub mod memory;
pub mod recorder;
pub mod resolver;
pub mod traits;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ResolutionError, StoreError, StoreResult};
pub use file::{FileVersionLog, SyncMode};
pub use index::VersionIndex;
pub use memory::InMemoryVersionLog;
pub use recorder::{Recorder, DEFAULT_TIMEOUT};
pub use resolver::Resolver;
pub use traits::{VersionLog, VersionReader, VersionStore};
