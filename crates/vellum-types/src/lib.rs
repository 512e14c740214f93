//! Foundation types for Vellum.
//!
//! Vellum records successive versions of artifacts produced by an external
//! build or commit process and serves the latest version of each. Every other
//! Vellum crate depends on `vellum-types`.
//!
//! # Key Types
//!
//! - [`ArtifactPath`] -- validated logical identity of an artifact
//! - [`ArtifactDraft`] -- ingestion input for one append
//! - [`ArtifactVersion`] -- immutable recorded state of an artifact
//! - [`Recency`] -- total order that decides the current version of a path
//! - [`VersionId`] -- UUID v7 assigned by the log on append
//! - [`ContentDigest`] -- BLAKE3 digest of artifact content

pub mod artifact;
pub mod digest;
pub mod error;
pub mod id;
pub mod path;
pub mod temporal;

pub use artifact::{ArtifactDraft, ArtifactVersion, Recency};
pub use digest::ContentDigest;
pub use error::ValidationError;
pub use id::VersionId;
pub use path::ArtifactPath;
pub use temporal::{format_timestamp, parse_timestamp};
