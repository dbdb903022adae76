//! Catalog store backends for the deduplication pipeline.
//!
//! [`CatalogStore`] is the swappable persistence seam: the processor only
//! talks to the trait. [`MemoryStore`] is a first-class backend for tests and
//! ephemeral runs; [`JsonStore`] reads and writes one JSON document per
//! record in a directory.
//!
//! Per-entry failures (a malformed document, an unwritable file) are recorded
//! as [`EntryError`] values and never abort the batch. Only whole-store
//! problems (the directory does not exist) surface as [`StoreError`].

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use blockforge_core::BlockRecord;

use crate::error::StoreError;

/// A recorded, non-fatal failure on a single catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryError {
    /// Which entry failed (a file name, an id, ...).
    pub entry: String,
    pub message: String,
}

impl fmt::Display for EntryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.entry, self.message)
    }
}

/// Result of loading a catalog: usable records plus recorded entry errors.
#[derive(Debug, Clone, Default)]
pub struct LoadOutcome {
    pub records: Vec<BlockRecord>,
    pub errors: Vec<EntryError>,
}

/// Result of materializing a record set.
#[derive(Debug, Clone, Default)]
pub struct MaterializeOutcome {
    pub written: usize,
    pub errors: Vec<EntryError>,
}

/// The storage contract for block catalogs.
///
/// Synchronous by design; the pipeline is single-threaded computation with
/// this as its only I/O boundary.
pub trait CatalogStore {
    /// Loads every entry, skipping malformed ones with a recorded error.
    fn load(&self) -> Result<LoadOutcome, StoreError>;

    /// Writes the surviving record set.
    fn materialize(&mut self, records: &[BlockRecord]) -> Result<MaterializeOutcome, StoreError>;
}

/// In-memory backend: records in, records out.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Vec<BlockRecord>,
    /// Simulated per-entry load failures, for exercising error paths.
    load_errors: Vec<EntryError>,
    materialized: Vec<BlockRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn with_records(records: Vec<BlockRecord>) -> Self {
        MemoryStore {
            records,
            ..Default::default()
        }
    }

    /// Registers an entry error that `load` will report alongside the records.
    pub fn push_load_error(&mut self, entry: impl Into<String>, message: impl Into<String>) {
        self.load_errors.push(EntryError {
            entry: entry.into(),
            message: message.into(),
        });
    }

    /// Records written by the last `materialize` call.
    pub fn materialized(&self) -> &[BlockRecord] {
        &self.materialized
    }
}

impl CatalogStore for MemoryStore {
    fn load(&self) -> Result<LoadOutcome, StoreError> {
        Ok(LoadOutcome {
            records: self.records.clone(),
            errors: self.load_errors.clone(),
        })
    }

    fn materialize(&mut self, records: &[BlockRecord]) -> Result<MaterializeOutcome, StoreError> {
        self.materialized = records.to_vec();
        Ok(MaterializeOutcome {
            written: records.len(),
            errors: Vec::new(),
        })
    }
}

/// Directory-of-JSON-documents backend: one record per `.json` file.
#[derive(Debug)]
pub struct JsonStore {
    input_dir: PathBuf,
    output_dir: PathBuf,
}

impl JsonStore {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        JsonStore {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    /// File name for a materialized record: a 16-char id prefix.
    fn file_name(record: &BlockRecord) -> String {
        let id = record.id.as_str();
        let end = id.len().min(16);
        format!("{}.json", &id[..end])
    }
}

impl CatalogStore for JsonStore {
    fn load(&self) -> Result<LoadOutcome, StoreError> {
        if !self.input_dir.exists() {
            return Err(StoreError::PathNotFound {
                path: self.input_dir.display().to_string(),
            });
        }

        // Sort by file name so load order (and thus first-seen order
        // downstream) does not depend on directory iteration order.
        let mut paths: Vec<PathBuf> = fs::read_dir(&self.input_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut outcome = LoadOutcome::default();
        for path in paths {
            match read_record(&path) {
                Ok(record) => outcome.records.push(record),
                Err(message) => {
                    let entry = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| path.display().to_string());
                    warn!(%entry, %message, "skipping malformed catalog entry");
                    outcome.errors.push(EntryError { entry, message });
                }
            }
        }

        Ok(outcome)
    }

    fn materialize(&mut self, records: &[BlockRecord]) -> Result<MaterializeOutcome, StoreError> {
        fs::create_dir_all(&self.output_dir)?;

        let mut outcome = MaterializeOutcome::default();
        for record in records {
            let path = self.output_dir.join(Self::file_name(record));
            match write_record(&path, record) {
                Ok(()) => outcome.written += 1,
                Err(message) => outcome.errors.push(EntryError {
                    entry: path.display().to_string(),
                    message,
                }),
            }
        }

        Ok(outcome)
    }
}

fn read_record(path: &Path) -> Result<BlockRecord, String> {
    let bytes = fs::read(path).map_err(|e| e.to_string())?;
    serde_json::from_slice(&bytes).map_err(|e| e.to_string())
}

fn write_record(path: &Path, record: &BlockRecord) -> Result<(), String> {
    let json = serde_json::to_vec_pretty(record).map_err(|e| e.to_string())?;
    fs::write(path, json).map_err(|e| e.to_string())
}
