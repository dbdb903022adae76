//! The deduplication pipeline: load, hash, decide, materialize.
//!
//! [`DeduplicationProcessor`] orchestrates the full pass over a catalog
//! store. Loaded records are read-only; execution produces derived records
//! (renames carry `original_name`) and excluded ids simply never reach the
//! store. Every run yields a [`ProcessingReport`] -- nothing is silently
//! dropped.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use blockforge_core::{BlockId, BlockRecord, LogFields};

use crate::error::StoreError;
use crate::policy::{DedupPolicy, PolicyDecision, PolicyEngine};
use crate::signature::{DuplicateGroup, SignatureHasher};
use crate::store::{CatalogStore, EntryError};

/// Aggregate outcome of one deduplication run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingReport {
    pub original_count: usize,
    pub final_count: usize,
    pub duplicates_found: usize,
    pub blocks_removed: usize,
    pub blocks_renamed: usize,
    pub decisions: Vec<PolicyDecision>,
    pub errors: Vec<EntryError>,
}

impl ProcessingReport {
    /// Share of the original catalog that was removed, as a percentage.
    pub fn reduction_percent(&self) -> f64 {
        if self.original_count == 0 {
            0.0
        } else {
            self.blocks_removed as f64 / self.original_count as f64 * 100.0
        }
    }
}

impl LogFields for ProcessingReport {
    fn log_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("original_count", self.original_count.to_string()),
            ("final_count", self.final_count.to_string()),
            ("duplicates_found", self.duplicates_found.to_string()),
            ("blocks_removed", self.blocks_removed.to_string()),
            ("blocks_renamed", self.blocks_renamed.to_string()),
            ("errors", self.errors.len().to_string()),
        ]
    }
}

/// Orchestrates load -> hash -> policy -> materialize over a catalog store.
pub struct DeduplicationProcessor<S: CatalogStore> {
    store: S,
    policy: DedupPolicy,
    hasher: SignatureHasher,
    engine: PolicyEngine,
    records: IndexMap<BlockId, BlockRecord>,
}

impl<S: CatalogStore> DeduplicationProcessor<S> {
    pub fn new(store: S, policy: DedupPolicy) -> Self {
        DeduplicationProcessor {
            store,
            policy,
            hasher: SignatureHasher::new(),
            engine: PolicyEngine::new(policy),
            records: IndexMap::new(),
        }
    }

    /// Runs the full pipeline.
    ///
    /// With `execute` false this is a dry run: duplicates are detected and
    /// decisions recorded, but nothing is materialized and the final count is
    /// projected from the decisions. With `execute` true, exclusions and
    /// renames are applied to derived records and the survivors are written
    /// through the store.
    pub fn run(&mut self, execute: bool) -> Result<ProcessingReport, StoreError> {
        let mut report = ProcessingReport::default();

        // Load. Malformed entries are recorded, never fatal.
        let outcome = self.store.load()?;
        report.errors.extend(outcome.errors);
        for record in outcome.records {
            self.hasher.add(&record);
            self.records.insert(record.id.clone(), record);
        }
        report.original_count = self.records.len();
        debug!(
            loaded = report.original_count,
            skipped = report.errors.len(),
            "catalog loaded"
        );

        // Detect and decide.
        let duplicates = self.hasher.find_all_duplicates();
        report.duplicates_found = duplicates.len();
        report.decisions = self.engine.process_all(&duplicates, Some(self.policy));

        if execute {
            let removals: std::collections::HashSet<BlockId> =
                self.engine.removal_list().into_iter().collect();
            let renames = self.engine.rename_map();

            let mut kept: Vec<BlockRecord> = Vec::with_capacity(self.records.len());
            for record in self.records.values() {
                if removals.contains(&record.id) {
                    report.blocks_removed += 1;
                    continue;
                }
                if let Some(new_name) = renames.get(&record.id) {
                    let mut derived = record.clone();
                    derived.original_name = Some(record.name.clone());
                    derived.name = new_name.clone();
                    report.blocks_renamed += 1;
                    kept.push(derived);
                } else {
                    kept.push(record.clone());
                }
            }

            let materialized = self.store.materialize(&kept)?;
            report.errors.extend(materialized.errors);
            report.final_count = materialized.written;
        } else {
            let stats = self.engine.statistics();
            report.blocks_removed = stats.blocks_removed;
            report.blocks_renamed = stats.blocks_renamed;
            report.final_count = report.original_count - report.blocks_removed;
        }

        info!(
            original = report.original_count,
            remaining = report.final_count,
            removed = report.blocks_removed,
            renamed = report.blocks_renamed,
            execute,
            "deduplication complete"
        );

        Ok(report)
    }

    /// The underlying store, for inspection after an execute run.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The signature hasher, for report generation and inspection.
    pub fn hasher(&self) -> &SignatureHasher {
        &self.hasher
    }

    /// The policy engine, for report generation and inspection.
    pub fn engine(&self) -> &PolicyEngine {
        &self.engine
    }

    /// Duplicate groups found by the last run, cloned for the caller.
    pub fn duplicate_groups(&self) -> Vec<DuplicateGroup> {
        self.hasher
            .find_all_duplicates()
            .into_iter()
            .cloned()
            .collect()
    }
}
