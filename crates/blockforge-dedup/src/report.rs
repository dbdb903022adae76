//! Human-readable and JSON reports for deduplication runs.

use serde_json::json;

use crate::processor::ProcessingReport;
use crate::signature::SignatureHasher;

/// Renders reports from a finished deduplication run.
pub struct DedupReport<'a> {
    hasher: &'a SignatureHasher,
    report: &'a ProcessingReport,
}

impl<'a> DedupReport<'a> {
    pub fn new(hasher: &'a SignatureHasher, report: &'a ProcessingReport) -> Self {
        DedupReport { hasher, report }
    }

    /// Short summary: run counts plus duplicate analysis.
    pub fn summary(&self) -> String {
        let stats = self.hasher.statistics();
        let mut lines = Vec::new();

        lines.push("deduplication summary".to_string());
        lines.push(format!("  original blocks:   {}", self.report.original_count));
        lines.push(format!("  final blocks:      {}", self.report.final_count));
        lines.push(format!("  duplicates found:  {}", self.report.duplicates_found));
        lines.push(format!("  blocks removed:    {}", self.report.blocks_removed));
        lines.push(format!("  blocks renamed:    {}", self.report.blocks_renamed));
        lines.push(format!(
            "  reduction:         {:.1}%",
            self.report.reduction_percent()
        ));
        lines.push(String::new());
        lines.push("duplicate analysis".to_string());
        lines.push(format!("  unique names:          {}", stats.unique_names));
        lines.push(format!("  names with duplicates: {}", stats.duplicate_names));
        lines.push(format!("  signature conflicts:   {}", stats.signature_conflicts));
        lines.push(format!("  exact duplicates:      {}", stats.exact_duplicates));
        lines.push(format!("  blocks affected:       {}", stats.blocks_affected));

        lines.join("\n")
    }

    /// Summary plus per-group breakdown and recorded decisions.
    pub fn detailed(&self, max_groups: usize) -> String {
        let mut lines = vec![self.summary(), String::new()];

        lines.push("duplicate groups".to_string());
        let duplicates = self.hasher.find_all_duplicates();
        for (i, group) in duplicates.iter().take(max_groups).enumerate() {
            lines.push(format!(
                "  [{}] '{}' - {} variants",
                i + 1,
                group.name,
                group.count()
            ));
            if group.has_signature_conflict() {
                lines.push("      status: signature conflict (parameters differ)".to_string());
            } else {
                lines.push("      status: exact duplicates (same parameters)".to_string());
            }
            for (sig, members) in group.variants() {
                lines.push(format!("      signature: {sig}"));
                for member in members.iter().take(2) {
                    lines.push(format!(
                        "        - {} (trust {:.3}, source {})",
                        member.block_id.short(),
                        member.trust_score,
                        member.source_file
                    ));
                }
            }
        }
        if duplicates.len() > max_groups {
            lines.push(format!(
                "  ... and {} more duplicate groups",
                duplicates.len() - max_groups
            ));
        }

        lines.push(String::new());
        lines.push("policy decisions".to_string());
        for decision in &self.report.decisions {
            lines.push(format!(
                "  {}: {}",
                decision.group_name,
                decision.policy.as_str()
            ));
            if let Some(kept) = &decision.kept_block_id {
                lines.push(format!("    kept: {}", kept.short()));
            }
            if decision.removed_count > 0 {
                lines.push(format!("    removed: {} blocks", decision.removed_count));
            }
        }

        if !self.report.errors.is_empty() {
            lines.push(String::new());
            lines.push("entry errors".to_string());
            for error in &self.report.errors {
                lines.push(format!("  {error}"));
            }
        }

        lines.join("\n")
    }

    /// JSON-serializable report body.
    pub fn to_json(&self) -> serde_json::Value {
        let stats = self.hasher.statistics();
        json!({
            "summary": {
                "original_count": self.report.original_count,
                "final_count": self.report.final_count,
                "duplicates_found": self.report.duplicates_found,
                "blocks_removed": self.report.blocks_removed,
                "blocks_renamed": self.report.blocks_renamed,
                "reduction_percent": (self.report.reduction_percent() * 100.0).round() / 100.0,
            },
            "analysis": stats,
            "decisions": self.report.decisions.iter().map(|d| json!({
                "group": d.group_name,
                "policy": d.policy.as_str(),
                "kept": d.kept_block_id.as_ref().map(|id| id.as_str().to_string()),
                "removed": d.removed_count,
            })).collect::<Vec<_>>(),
            "errors": self.report.errors,
        })
    }
}
