//! Output-to-input compatibility checking.
//!
//! [`CompatibilityChecker::check`] scores whether one block's outputs can
//! feed another's inputs, comparing every (output, input) pair against a
//! fixed type matrix, the blocks' declared constraints, and their trust
//! scores. The check is directional: `check(a, b)` and `check(b, a)` are
//! independent results.

use serde::{Deserialize, Serialize};

use blockforge_core::{BlockId, BlockRecord, DataType, LogFields};

use crate::config::{CompatibilityConfig, ConfigError};

/// Status of a compatibility check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompatibilityStatus {
    Compatible,
    Partial,
    Incompatible,
    Unknown,
}

/// Result of matching one output type against one input type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeMatch {
    pub source_type: DataType,
    pub target_type: DataType,
    pub is_match: bool,
    pub requires_conversion: bool,
    pub conversion_risk: f64,
}

/// Result of one directional compatibility check. Ephemeral, computed per
/// ordered pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompatibilityResult {
    pub status: CompatibilityStatus,
    pub source_id: BlockId,
    pub target_id: BlockId,
    pub type_matches: Vec<TypeMatch>,
    pub constraint_issues: Vec<String>,
    pub trust_compatible: bool,
    pub overall_score: f64,
    pub recommendations: Vec<String>,
}

impl CompatibilityResult {
    pub fn is_compatible(&self) -> bool {
        self.status == CompatibilityStatus::Compatible
    }
}

impl LogFields for CompatibilityResult {
    fn log_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("source", self.source_id.short().to_string()),
            ("target", self.target_id.short().to_string()),
            ("status", format!("{:?}", self.status).to_lowercase()),
            ("score", format!("{:.3}", self.overall_score)),
            ("type_pairs", self.type_matches.len().to_string()),
            ("constraint_issues", self.constraint_issues.len().to_string()),
            ("trust_compatible", self.trust_compatible.to_string()),
        ]
    }
}

/// Scores output-to-input compatibility between block pairs.
#[derive(Debug, Default)]
pub struct CompatibilityChecker {
    config: CompatibilityConfig,
}

impl CompatibilityChecker {
    pub fn new() -> Self {
        CompatibilityChecker {
            config: CompatibilityConfig::default(),
        }
    }

    /// Builds a checker with a custom config, validating it up front.
    pub fn with_config(config: CompatibilityConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(CompatibilityChecker { config })
    }

    pub fn config(&self) -> &CompatibilityConfig {
        &self.config
    }

    /// `true` iff a value of type `source` satisfies an input of type
    /// `target`: target is `any`, the types are equal, or the pair is a
    /// declared widening (integer -> float).
    pub fn types_match(&self, source: DataType, target: DataType) -> bool {
        target == DataType::Any
            || source == target
            || (source == DataType::Integer && target == DataType::Float)
    }

    /// Checks whether `source`'s outputs can feed `target`'s inputs.
    pub fn check(&self, source: &BlockRecord, target: &BlockRecord) -> CompatibilityResult {
        let type_matches = self.match_types(source, target);
        let constraint_issues = self.constraint_issues(source, target);
        let trust_compatible = self.trust_compatible(source, target);

        let overall_score =
            self.score(&type_matches, constraint_issues.len(), trust_compatible);

        let status = if overall_score >= self.config.compatible_threshold
            && constraint_issues.is_empty()
        {
            CompatibilityStatus::Compatible
        } else if overall_score >= self.config.partial_threshold {
            CompatibilityStatus::Partial
        } else if overall_score > 0.0 {
            CompatibilityStatus::Incompatible
        } else {
            CompatibilityStatus::Unknown
        };

        let recommendations =
            self.recommendations(&type_matches, &constraint_issues, trust_compatible);

        CompatibilityResult {
            status,
            source_id: source.id.clone(),
            target_id: target.id.clone(),
            type_matches,
            constraint_issues,
            trust_compatible,
            overall_score,
            recommendations,
        }
    }

    /// Compares every (output, input) pair.
    fn match_types(&self, source: &BlockRecord, target: &BlockRecord) -> Vec<TypeMatch> {
        let mut matches = Vec::with_capacity(source.outputs.len() * target.inputs.len());
        for output in &source.outputs {
            for input in &target.inputs {
                let is_match = self.types_match(output.data_type, input.data_type);
                let requires_conversion = output.data_type != input.data_type
                    && input.data_type != DataType::Any;
                matches.push(TypeMatch {
                    source_type: output.data_type,
                    target_type: input.data_type,
                    is_match,
                    requires_conversion,
                    conversion_risk: self
                        .config
                        .conversion_risk(output.data_type, input.data_type),
                });
            }
        }
        matches
    }

    fn constraint_issues(&self, source: &BlockRecord, target: &BlockRecord) -> Vec<String> {
        let mut issues = Vec::new();

        if target.is_pure() && !source.is_pure() {
            issues.push("target requires pure input but source is impure".to_string());
        }
        if target.deterministic && !source.deterministic {
            issues.push(
                "target requires deterministic input but source is non-deterministic"
                    .to_string(),
            );
        }
        if source.can_fail && !target.can_fail {
            issues.push("source can fail but target does not handle failures".to_string());
        }

        issues
    }

    /// Trust gate: both blocks above the floor, and within the allowed gap.
    fn trust_compatible(&self, source: &BlockRecord, target: &BlockRecord) -> bool {
        if source.trust_score < self.config.trust_floor
            || target.trust_score < self.config.trust_floor
        {
            return false;
        }
        (source.trust_score - target.trust_score).abs() <= self.config.max_trust_gap
    }

    fn score(&self, type_matches: &[TypeMatch], issue_count: usize, trust_compatible: bool) -> f64 {
        // Zero declared pairs defaults to 0.5: unknown, don't block.
        let type_score = if type_matches.is_empty() {
            0.5
        } else {
            type_matches
                .iter()
                .map(|m| {
                    if m.is_match {
                        1.0
                    } else if m.requires_conversion {
                        0.5
                    } else {
                        0.0
                    }
                })
                .sum::<f64>()
                / type_matches.len() as f64
        };

        let constraint_score =
            (1.0 - self.config.constraint_penalty * issue_count as f64).max(0.0);

        let trust_score = if trust_compatible { 1.0 } else { 0.5 };

        type_score * self.config.type_weight
            + constraint_score * self.config.constraint_weight
            + trust_score * self.config.trust_weight
    }

    fn recommendations(
        &self,
        type_matches: &[TypeMatch],
        constraint_issues: &[String],
        trust_compatible: bool,
    ) -> Vec<String> {
        let mut recommendations = Vec::new();

        for m in type_matches {
            if m.requires_conversion {
                recommendations.push(format!(
                    "consider adding a conversion from {} to {}",
                    m.source_type, m.target_type
                ));
            }
        }
        for issue in constraint_issues {
            recommendations.push(format!("address constraint issue: {issue}"));
        }
        if !trust_compatible {
            recommendations
                .push("improve trust scores to bring the blocks within range".to_string());
        }

        recommendations
    }

    /// Candidates whose compatibility score reaches `min_score`, sorted by
    /// descending score with stable ties.
    ///
    /// `min_score` outside [0, 1] is a configuration error and fails fast.
    pub fn find_compatible_blocks<'a>(
        &self,
        source: &BlockRecord,
        candidates: &'a [BlockRecord],
        min_score: f64,
    ) -> Result<Vec<(&'a BlockRecord, CompatibilityResult)>, ConfigError> {
        if !(0.0..=1.0).contains(&min_score) {
            return Err(ConfigError::OutOfRange {
                name: "min_score",
                value: min_score,
                expected: "[0, 1]",
            });
        }

        let mut compatible: Vec<(&BlockRecord, CompatibilityResult)> = candidates
            .iter()
            .map(|candidate| (candidate, self.check(source, candidate)))
            .filter(|(_, result)| result.overall_score >= min_score)
            .collect();

        // Stable sort keeps input order among equal scores.
        compatible.sort_by(|a, b| {
            b.1.overall_score
                .partial_cmp(&a.1.overall_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(compatible)
    }
}
