//! Resolution policies for duplicate groups.
//!
//! The [`PolicyEngine`] turns a [`DuplicateGroup`] into a [`PolicyDecision`]:
//! one per group per run, listing the action for every member. "remove" and
//! "quarantine" are distinct audit labels but are treated identically at
//! materialization (both excluded); "rename" rewrites the block name and tags
//! the original.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use blockforge_core::{BlockId, LogFields};

use crate::error::DedupError;
use crate::signature::DuplicateGroup;

/// How to resolve a duplicate group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupPolicy {
    /// Retain the member with the highest trust score, mark the rest removed.
    KeepBest,
    /// Rename every member under a source-derived namespace.
    Namespace,
    /// Exclude every member pending manual review.
    Quarantine,
    /// Analysis only; nothing removed or renamed.
    KeepAll,
}

impl DedupPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DedupPolicy::KeepBest => "keep_best",
            DedupPolicy::Namespace => "namespace",
            DedupPolicy::Quarantine => "quarantine",
            DedupPolicy::KeepAll => "keep_all",
        }
    }
}

impl FromStr for DedupPolicy {
    type Err = DedupError;

    /// Accepts snake_case or kebab-case tokens. Unknown names fail fast:
    /// a policy typo is programmer error, not data error.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.replace('-', "_").as_str() {
            "keep_best" => Ok(DedupPolicy::KeepBest),
            "namespace" => Ok(DedupPolicy::Namespace),
            "quarantine" => Ok(DedupPolicy::Quarantine),
            "keep_all" => Ok(DedupPolicy::KeepAll),
            other => Err(DedupError::UnknownPolicy {
                token: other.to_string(),
            }),
        }
    }
}

/// Per-block action labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupAction {
    Keep,
    Remove,
    Rename,
    Quarantine,
}

/// Action taken on a specific block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockAction {
    pub block_id: BlockId,
    pub original_name: String,
    pub action: DedupAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_name: Option<String>,
    pub reason: String,
}

/// Decision made for one duplicate group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDecision {
    pub group_name: String,
    pub policy: DedupPolicy,
    pub actions: Vec<BlockAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kept_block_id: Option<BlockId>,
    pub removed_count: usize,
}

impl LogFields for PolicyDecision {
    fn log_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("group", self.group_name.clone()),
            ("policy", self.policy.as_str().to_string()),
            ("actions", self.actions.len().to_string()),
            (
                "kept",
                self.kept_block_id
                    .as_ref()
                    .map(|id| id.short().to_string())
                    .unwrap_or_default(),
            ),
            ("removed", self.removed_count.to_string()),
        ]
    }
}

/// Policy application statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyStats {
    pub groups_processed: usize,
    pub blocks_removed: usize,
    pub blocks_renamed: usize,
    pub keep_best: usize,
    pub namespace: usize,
    pub quarantine: usize,
    pub keep_all: usize,
}

/// Applies resolution policies and records the decisions.
#[derive(Debug)]
pub struct PolicyEngine {
    default_policy: DedupPolicy,
    decisions: Vec<PolicyDecision>,
}

impl PolicyEngine {
    pub fn new(default_policy: DedupPolicy) -> Self {
        PolicyEngine {
            default_policy,
            decisions: Vec::new(),
        }
    }

    /// Derives a namespace token from a source location.
    ///
    /// Takes the last path segment and cuts it at the first `.` or `_`, so
    /// `sources/string_operations.rs` becomes `string`. Empty input yields
    /// `unknown`.
    fn namespace_token(source_file: &str) -> String {
        let filename = source_file.rsplit('/').next().unwrap_or("");
        let token = filename
            .split(['.', '_'])
            .next()
            .unwrap_or("");
        if token.is_empty() {
            "unknown".to_string()
        } else {
            token.to_string()
        }
    }

    /// keep-best: one member kept (max trust, ties to first), rest removed.
    pub fn apply_keep_best(&self, group: &DuplicateGroup) -> PolicyDecision {
        let best_id = group.best_member().map(|b| b.block_id.clone());
        let mut decision = PolicyDecision {
            group_name: group.name.clone(),
            policy: DedupPolicy::KeepBest,
            actions: Vec::new(),
            kept_block_id: best_id.clone(),
            removed_count: 0,
        };

        for member in &group.members {
            if Some(&member.block_id) == best_id.as_ref() {
                decision.actions.push(BlockAction {
                    block_id: member.block_id.clone(),
                    original_name: member.name.clone(),
                    action: DedupAction::Keep,
                    new_name: None,
                    reason: format!("highest trust score ({:.3})", member.trust_score),
                });
            } else {
                decision.actions.push(BlockAction {
                    block_id: member.block_id.clone(),
                    original_name: member.name.clone(),
                    action: DedupAction::Remove,
                    new_name: None,
                    reason: format!("lower trust score ({:.3}) than kept", member.trust_score),
                });
                decision.removed_count += 1;
            }
        }

        decision
    }

    /// namespace: every member renamed `{namespace}.{name}`; collisions get
    /// an incrementing numeric suffix starting at 2.
    pub fn apply_namespace(&self, group: &DuplicateGroup) -> PolicyDecision {
        let mut decision = PolicyDecision {
            group_name: group.name.clone(),
            policy: DedupPolicy::Namespace,
            actions: Vec::new(),
            kept_block_id: None,
            removed_count: 0,
        };

        let mut used: HashSet<String> = HashSet::new();

        for member in &group.members {
            let mut namespace = Self::namespace_token(&member.source_file);
            if used.contains(&namespace) {
                let mut counter = 2usize;
                while used.contains(&format!("{namespace}{counter}")) {
                    counter += 1;
                }
                namespace = format!("{namespace}{counter}");
            }
            used.insert(namespace.clone());

            decision.actions.push(BlockAction {
                block_id: member.block_id.clone(),
                original_name: member.name.clone(),
                action: DedupAction::Rename,
                new_name: Some(format!("{}.{}", namespace, member.name)),
                reason: format!("namespaced from {}", member.source_file),
            });
        }

        decision
    }

    /// quarantine: every member excluded pending manual review.
    pub fn apply_quarantine(&self, group: &DuplicateGroup) -> PolicyDecision {
        let mut decision = PolicyDecision {
            group_name: group.name.clone(),
            policy: DedupPolicy::Quarantine,
            actions: Vec::new(),
            kept_block_id: None,
            removed_count: 0,
        };

        for member in &group.members {
            decision.actions.push(BlockAction {
                block_id: member.block_id.clone(),
                original_name: member.name.clone(),
                action: DedupAction::Quarantine,
                new_name: None,
                reason: "manual review required for duplicate resolution".to_string(),
            });
            decision.removed_count += 1;
        }

        decision
    }

    /// keep-all: analysis only, every member kept.
    pub fn apply_keep_all(&self, group: &DuplicateGroup) -> PolicyDecision {
        let mut decision = PolicyDecision {
            group_name: group.name.clone(),
            policy: DedupPolicy::KeepAll,
            actions: Vec::new(),
            kept_block_id: None,
            removed_count: 0,
        };

        for member in &group.members {
            decision.actions.push(BlockAction {
                block_id: member.block_id.clone(),
                original_name: member.name.clone(),
                action: DedupAction::Keep,
                new_name: None,
                reason: "policy keeps all variants".to_string(),
            });
        }

        decision
    }

    /// Applies a policy (or the default) to one group and records the decision.
    pub fn process_group(
        &mut self,
        group: &DuplicateGroup,
        policy: Option<DedupPolicy>,
    ) -> PolicyDecision {
        let policy = policy.unwrap_or(self.default_policy);
        let decision = match policy {
            DedupPolicy::KeepBest => self.apply_keep_best(group),
            DedupPolicy::Namespace => self.apply_namespace(group),
            DedupPolicy::Quarantine => self.apply_quarantine(group),
            DedupPolicy::KeepAll => self.apply_keep_all(group),
        };
        self.decisions.push(decision.clone());
        decision
    }

    /// Applies a policy to every group, in order.
    pub fn process_all(
        &mut self,
        groups: &[&DuplicateGroup],
        policy: Option<DedupPolicy>,
    ) -> Vec<PolicyDecision> {
        groups
            .iter()
            .map(|group| self.process_group(group, policy))
            .collect()
    }

    /// Block ids excluded at materialization (removed or quarantined).
    pub fn removal_list(&self) -> Vec<BlockId> {
        self.decisions
            .iter()
            .flat_map(|d| &d.actions)
            .filter(|a| matches!(a.action, DedupAction::Remove | DedupAction::Quarantine))
            .map(|a| a.block_id.clone())
            .collect()
    }

    /// Map of block id -> new name for rename actions.
    pub fn rename_map(&self) -> HashMap<BlockId, String> {
        self.decisions
            .iter()
            .flat_map(|d| &d.actions)
            .filter_map(|a| {
                if a.action == DedupAction::Rename {
                    a.new_name
                        .as_ref()
                        .map(|name| (a.block_id.clone(), name.clone()))
                } else {
                    None
                }
            })
            .collect()
    }

    /// All decisions recorded so far, in processing order.
    pub fn decisions(&self) -> &[PolicyDecision] {
        &self.decisions
    }

    pub fn statistics(&self) -> PolicyStats {
        let mut stats = PolicyStats {
            groups_processed: self.decisions.len(),
            blocks_removed: self.decisions.iter().map(|d| d.removed_count).sum(),
            blocks_renamed: self.rename_map().len(),
            ..Default::default()
        };
        for decision in &self.decisions {
            match decision.policy {
                DedupPolicy::KeepBest => stats.keep_best += 1,
                DedupPolicy::Namespace => stats.namespace += 1,
                DedupPolicy::Quarantine => stats.quarantine += 1,
                DedupPolicy::KeepAll => stats.keep_all += 1,
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::{compute_signature, BlockSignature};
    use blockforge_core::{BlockRecord, DataType, Param, SourceLocation};

    fn signature(id: &str, name: &str, param: &str, trust: f64, file: &str) -> BlockSignature {
        let record = BlockRecord::new(id, name)
            .with_inputs(vec![Param::new(param, DataType::String)])
            .with_trust(trust)
            .with_source(SourceLocation::new(file));
        compute_signature(&record)
    }

    fn group(members: Vec<BlockSignature>) -> DuplicateGroup {
        DuplicateGroup {
            name: members[0].name.clone(),
            members,
        }
    }

    #[test]
    fn policy_parsing_accepts_known_tokens_only() {
        assert_eq!("keep_best".parse::<DedupPolicy>().unwrap(), DedupPolicy::KeepBest);
        assert_eq!("keep-best".parse::<DedupPolicy>().unwrap(), DedupPolicy::KeepBest);
        assert_eq!("namespace".parse::<DedupPolicy>().unwrap(), DedupPolicy::Namespace);
        assert_eq!("quarantine".parse::<DedupPolicy>().unwrap(), DedupPolicy::Quarantine);
        assert_eq!("keep_all".parse::<DedupPolicy>().unwrap(), DedupPolicy::KeepAll);

        let err = "merge".parse::<DedupPolicy>();
        assert!(matches!(err, Err(DedupError::UnknownPolicy { token }) if token == "merge"));
    }

    #[test]
    fn keep_best_retains_max_trust_and_counts_add_up() {
        // Trust .7 / .9 / .5: keep-best retains the .9 member only.
        let g = group(vec![
            signature("a", "normalize", "text", 0.7, "sources/text_utils.rs"),
            signature("b", "normalize", "text", 0.9, "sources/string_ops.rs"),
            signature("c", "normalize", "value", 0.5, "sources/misc.rs"),
        ]);
        let mut engine = PolicyEngine::new(DedupPolicy::KeepBest);
        let decision = engine.process_group(&g, None);

        assert_eq!(decision.kept_block_id, Some("b".into()));
        assert_eq!(decision.removed_count, 2);
        let kept = decision
            .actions
            .iter()
            .filter(|a| a.action == DedupAction::Keep)
            .count();
        assert_eq!(kept, 1);
        assert_eq!(kept + decision.removed_count, g.count());
    }

    #[test]
    fn keep_best_tie_goes_to_first_member() {
        let g = group(vec![
            signature("first", "f", "text", 0.8, "a.rs"),
            signature("second", "f", "text", 0.8, "b.rs"),
        ]);
        let mut engine = PolicyEngine::new(DedupPolicy::KeepBest);
        let decision = engine.process_group(&g, None);
        assert_eq!(decision.kept_block_id, Some("first".into()));
    }

    #[test]
    fn namespace_renames_every_member() {
        let g = group(vec![
            signature("a", "parse", "text", 0.5, "sources/json_utilities.rs"),
            signature("b", "parse", "text", 0.5, "sources/url_helpers.rs"),
        ]);
        let mut engine = PolicyEngine::new(DedupPolicy::Namespace);
        let decision = engine.process_group(&g, None);

        assert_eq!(decision.removed_count, 0);
        let names: Vec<&str> = decision
            .actions
            .iter()
            .map(|a| a.new_name.as_deref().unwrap())
            .collect();
        assert_eq!(names, vec!["json.parse", "url.parse"]);
        assert!(decision
            .actions
            .iter()
            .all(|a| a.action == DedupAction::Rename));
    }

    #[test]
    fn namespace_collisions_get_numeric_suffixes() {
        let g = group(vec![
            signature("a", "parse", "text", 0.5, "sources/json_a.rs"),
            signature("b", "parse", "text", 0.5, "sources/json_b.rs"),
            signature("c", "parse", "text", 0.5, "sources/json_c.rs"),
        ]);
        let mut engine = PolicyEngine::new(DedupPolicy::Namespace);
        let decision = engine.process_group(&g, None);

        let names: Vec<&str> = decision
            .actions
            .iter()
            .map(|a| a.new_name.as_deref().unwrap())
            .collect();
        assert_eq!(names, vec!["json.parse", "json2.parse", "json3.parse"]);
    }

    #[test]
    fn namespace_token_handles_missing_source() {
        let g = group(vec![signature("a", "parse", "text", 0.5, "")]);
        let mut engine = PolicyEngine::new(DedupPolicy::Namespace);
        let decision = engine.process_group(&g, None);
        assert_eq!(decision.actions[0].new_name.as_deref(), Some("unknown.parse"));
    }

    #[test]
    fn quarantine_excludes_everything_with_its_own_label() {
        let g = group(vec![
            signature("a", "f", "text", 0.5, "a.rs"),
            signature("b", "f", "text", 0.5, "b.rs"),
        ]);
        let mut engine = PolicyEngine::new(DedupPolicy::Quarantine);
        let decision = engine.process_group(&g, None);

        assert_eq!(decision.removed_count, 2);
        assert!(decision
            .actions
            .iter()
            .all(|a| a.action == DedupAction::Quarantine));
        // Quarantined blocks land on the removal list with removed ones.
        assert_eq!(engine.removal_list().len(), 2);
    }

    #[test]
    fn keep_all_changes_nothing() {
        let g = group(vec![
            signature("a", "f", "text", 0.5, "a.rs"),
            signature("b", "f", "text", 0.5, "b.rs"),
        ]);
        let mut engine = PolicyEngine::new(DedupPolicy::KeepAll);
        let decision = engine.process_group(&g, None);

        assert_eq!(decision.removed_count, 0);
        assert!(engine.removal_list().is_empty());
        assert!(engine.rename_map().is_empty());
    }

    #[test]
    fn statistics_aggregate_decisions() {
        let g1 = group(vec![
            signature("a", "f", "text", 0.9, "a.rs"),
            signature("b", "f", "text", 0.5, "b.rs"),
        ]);
        let g2 = group(vec![
            signature("c", "g", "text", 0.5, "sources/json_x.rs"),
            signature("d", "g", "text", 0.5, "sources/csv_x.rs"),
        ]);
        let mut engine = PolicyEngine::new(DedupPolicy::KeepBest);
        engine.process_group(&g1, None);
        engine.process_group(&g2, Some(DedupPolicy::Namespace));

        let stats = engine.statistics();
        assert_eq!(stats.groups_processed, 2);
        assert_eq!(stats.blocks_removed, 1);
        assert_eq!(stats.blocks_renamed, 2);
        assert_eq!(stats.keep_best, 1);
        assert_eq!(stats.namespace, 1);
    }

    #[test]
    fn decision_exposes_flat_log_fields() {
        let g = group(vec![
            signature("aaaa-bbbb-cccc-dddd", "f", "text", 0.9, "a.rs"),
            signature("b", "f", "text", 0.5, "b.rs"),
        ]);
        let mut engine = PolicyEngine::new(DedupPolicy::KeepBest);
        let decision = engine.process_group(&g, None);

        let fields = decision.log_fields();
        assert!(fields.contains(&("policy", "keep_best".to_string())));
        assert!(fields.contains(&("removed", "1".to_string())));
    }
}
