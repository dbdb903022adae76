//! Catalog-wide interface normalization.
//!
//! [`InterfaceNormalizer`] applies the [`ParameterMapper`] across a slice of
//! block records, producing derived records whose input parameters carry
//! canonical names. Original names are preserved as aliases plus an
//! `original_name` tag, so old names remain valid. Input records are never
//! mutated.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

use blockforge_core::{BlockRecord, LogFields};

use crate::mapper::{
    mapper_statistics, BlockMappingResult, MappingConfidence, MappingStats, ParameterMapper,
    ParameterMapping,
};

/// Dry-run analysis over a record set: statistics only, no derived records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisStats {
    pub blocks_analyzed: usize,
    pub blocks_with_changes: usize,
    pub mapping: MappingStats,
    /// Most frequent `original -> canonical` pairs, descending by count.
    pub top_mappings: Vec<(String, usize)>,
}

/// Outcome of a normalization pass over a record set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NormalizationReport {
    pub blocks_processed: usize,
    pub blocks_modified: usize,
    pub parameters_normalized: usize,
    pub parameters_unchanged: usize,
    pub parameters_unmapped: usize,
    /// Names of the blocks whose interface changed, in input order.
    pub modified_blocks: Vec<String>,
}

impl LogFields for NormalizationReport {
    fn log_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("blocks_processed", self.blocks_processed.to_string()),
            ("blocks_modified", self.blocks_modified.to_string()),
            ("parameters_normalized", self.parameters_normalized.to_string()),
            ("parameters_unchanged", self.parameters_unchanged.to_string()),
            ("parameters_unmapped", self.parameters_unmapped.to_string()),
        ]
    }
}

/// Derived records plus the report describing what changed.
#[derive(Debug, Clone, Default)]
pub struct NormalizationOutcome {
    pub records: Vec<BlockRecord>,
    pub report: NormalizationReport,
}

/// Normalizes block interfaces with canonical parameter names.
pub struct InterfaceNormalizer<'m, 'v> {
    mapper: &'m ParameterMapper<'v>,
    min_confidence: MappingConfidence,
}

impl<'m, 'v> InterfaceNormalizer<'m, 'v> {
    /// Mappings below `min_confidence` are reported but not applied.
    pub fn new(mapper: &'m ParameterMapper<'v>, min_confidence: MappingConfidence) -> Self {
        InterfaceNormalizer {
            mapper,
            min_confidence,
        }
    }

    /// Inspects a record set without producing derived records.
    pub fn analyze(&self, records: &[BlockRecord]) -> AnalysisStats {
        let results: Vec<BlockMappingResult> = records
            .iter()
            .map(|r| self.mapper.map_block_interface(&r.id, &r.name, &r.inputs))
            .collect();

        let blocks_with_changes = results.iter().filter(|r| r.has_changes()).count();

        let mut pair_counts: HashMap<String, usize> = HashMap::new();
        for result in &results {
            for m in &result.mappings {
                let key = format!("{} -> {}", m.original_name, m.canonical_name);
                *pair_counts.entry(key).or_insert(0) += 1;
            }
        }
        let mut top_mappings: Vec<(String, usize)> = pair_counts.into_iter().collect();
        top_mappings.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_mappings.truncate(20);

        AnalysisStats {
            blocks_analyzed: results.len(),
            blocks_with_changes,
            mapping: mapper_statistics(&results),
            top_mappings,
        }
    }

    /// Produces derived records with canonical input names.
    ///
    /// Idempotent: running the output through `normalize` again yields
    /// identical records, since canonical names resolve to themselves.
    pub fn normalize(&self, records: &[BlockRecord]) -> NormalizationOutcome {
        let mut outcome = NormalizationOutcome::default();

        for record in records {
            outcome.report.blocks_processed += 1;

            let mapping_result =
                self.mapper
                    .map_block_interface(&record.id, &record.name, &record.inputs);

            outcome.report.parameters_unchanged += mapping_result.unchanged.len();
            outcome.report.parameters_unmapped += mapping_result.unmapped.len();

            let applicable: HashMap<&str, &ParameterMapping> = mapping_result
                .mappings
                .iter()
                .filter(|m| m.confidence >= self.min_confidence)
                .map(|m| (m.original_name.as_str(), m))
                .collect();

            if applicable.is_empty() {
                outcome.records.push(record.clone());
                continue;
            }

            let mut derived = record.clone();
            let mut renamed = 0usize;
            for param in &mut derived.inputs {
                if let Some(mapping) = applicable.get(param.name.as_str()) {
                    if !param.aliases.contains(&param.name) {
                        param.aliases.push(param.name.clone());
                    }
                    param.original_name = Some(param.name.clone());
                    param.name = mapping.canonical_name.clone();
                    renamed += 1;
                }
            }

            debug!(block = %record.name, renamed, "normalized block interface");

            outcome.report.blocks_modified += 1;
            outcome.report.parameters_normalized += renamed;
            outcome.report.modified_blocks.push(record.name.clone());
            outcome.records.push(derived);
        }

        info!(
            processed = outcome.report.blocks_processed,
            modified = outcome.report.blocks_modified,
            "interface normalization complete"
        );

        outcome
    }
}
