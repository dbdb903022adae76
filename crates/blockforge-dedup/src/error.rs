//! Error types for blockforge-dedup.
//!
//! [`DedupError`] covers configuration mistakes (programmer error, fails
//! fast). [`StoreError`] covers whole-store failures in a catalog backend.
//! Per-entry data problems are NOT errors here -- they are recorded as
//! [`crate::store::EntryError`] values and the pipeline continues.

use thiserror::Error;

/// Configuration errors in the deduplication layer.
#[derive(Debug, Error)]
pub enum DedupError {
    /// A policy name outside the known set was supplied.
    #[error("unknown deduplication policy: '{token}'")]
    UnknownPolicy { token: String },
}

/// Errors produced by catalog store backends.
///
/// These abort the whole load/materialize call; a single malformed entry
/// never raises one.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The catalog location does not exist.
    #[error("catalog path not found: {path}")]
    PathNotFound { path: String },

    /// Filesystem failure outside any single entry.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
