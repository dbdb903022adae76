//! Composition graph validation.
//!
//! [`GraphValidator::validate`] runs five independent passes over a
//! [`CompositionGraph`] and reports ALL findings at once: cycle detection,
//! per-edge type consistency, trust floors, structural checks (orphans and
//! unreachable nodes), and error-handling chains. Violations are structured
//! data, never errors -- a batch of graphs can be validated and reported
//! together.

use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::debug;

use blockforge_core::{BlockId, BlockRecord, LogFields};

use crate::compatibility::CompatibilityChecker;
use crate::error::ComposeError;
use crate::graph::CompositionGraph;

/// Overall status of a validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Valid,
    Warning,
    Invalid,
}

/// The rule a violation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleViolation {
    CycleDetected,
    TypeMismatch,
    TrustViolation,
    OrphanNode,
    UnreachableNode,
    ErrorNotHandled,
}

/// How serious a violation is. Every severity blocks validity; the grades
/// exist for reporting and triage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
}

/// One rule violation with the nodes involved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub rule: RuleViolation,
    pub severity: Severity,
    pub nodes: Vec<BlockId>,
    pub message: String,
}

/// Result of validating one composition graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub status: ValidationStatus,
    /// `true` iff there are zero violations of any severity.
    pub is_valid: bool,
    pub violations: Vec<Violation>,
    /// Non-fatal findings (low-trust nodes).
    pub warnings: Vec<String>,
    pub node_count: usize,
    pub edge_count: usize,
    /// Mean node trust score; 0.0 for an empty graph.
    pub graph_trust_score: f64,
}

impl LogFields for ValidationReport {
    fn log_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("status", format!("{:?}", self.status).to_lowercase()),
            ("is_valid", self.is_valid.to_string()),
            ("violations", self.violations.len().to_string()),
            ("warnings", self.warnings.len().to_string()),
            ("nodes", self.node_count.to_string()),
            ("edges", self.edge_count.to_string()),
            ("graph_trust", format!("{:.3}", self.graph_trust_score)),
        ]
    }
}

/// Validates composition graphs against the composition rules.
#[derive(Debug, Default)]
pub struct GraphValidator {
    checker: CompatibilityChecker,
}

/// Trust scores below this are warnings (the hard floor comes from the
/// checker config).
const LOW_TRUST_WARNING: f64 = 0.5;

impl GraphValidator {
    pub fn new() -> Self {
        GraphValidator {
            checker: CompatibilityChecker::new(),
        }
    }

    /// Uses a custom checker, so the validator and the compatibility layer
    /// share one config and cannot disagree on thresholds.
    pub fn with_checker(checker: CompatibilityChecker) -> Self {
        GraphValidator { checker }
    }

    /// Runs all five validation passes and assembles the report.
    pub fn validate(&self, graph: &CompositionGraph) -> ValidationReport {
        let mut violations = Vec::new();
        let mut warnings = Vec::new();

        if let Some(cycle) = self.check_cycles(graph) {
            violations.push(cycle);
        }
        violations.extend(self.check_type_consistency(graph));
        self.check_trust(graph, &mut violations, &mut warnings);
        violations.extend(self.check_structure(graph));
        violations.extend(self.check_error_handling(graph));

        let is_valid = violations.is_empty();
        let status = if !is_valid {
            ValidationStatus::Invalid
        } else if !warnings.is_empty() {
            ValidationStatus::Warning
        } else {
            ValidationStatus::Valid
        };

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            violations = violations.len(),
            warnings = warnings.len(),
            "graph validation finished"
        );

        ValidationReport {
            status,
            is_valid,
            violations,
            warnings,
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
            graph_trust_score: self.graph_trust(graph),
        }
    }

    /// Pass 1: cycle detection.
    ///
    /// Depth-first traversal with an explicit frame stack (no recursion, so
    /// deep graphs cannot overflow). The first cycle found produces a single
    /// critical violation listing the nodes on the cycle path, and the search
    /// stops.
    fn check_cycles(&self, graph: &CompositionGraph) -> Option<Violation> {
        struct Frame {
            id: BlockId,
            successors: Vec<BlockId>,
            next: usize,
        }

        let mut visited: HashSet<BlockId> = HashSet::new();
        let mut on_stack: HashSet<BlockId> = HashSet::new();

        for root in graph.block_ids() {
            if visited.contains(root) {
                continue;
            }
            visited.insert(root.clone());
            on_stack.insert(root.clone());
            let mut stack = vec![Frame {
                id: root.clone(),
                successors: graph.successors(root),
                next: 0,
            }];

            while let Some(frame) = stack.last_mut() {
                if frame.next < frame.successors.len() {
                    let child = frame.successors[frame.next].clone();
                    frame.next += 1;

                    if on_stack.contains(&child) {
                        // The cycle is the stack suffix starting at `child`.
                        let start = stack
                            .iter()
                            .position(|f| f.id == child)
                            .unwrap_or(0);
                        let nodes: Vec<BlockId> =
                            stack[start..].iter().map(|f| f.id.clone()).collect();
                        return Some(Violation {
                            rule: RuleViolation::CycleDetected,
                            severity: Severity::Critical,
                            nodes,
                            message: "cycle detected in composition graph".to_string(),
                        });
                    }
                    if !visited.contains(&child) {
                        visited.insert(child.clone());
                        on_stack.insert(child.clone());
                        let successors = graph.successors(&child);
                        stack.push(Frame {
                            id: child,
                            successors,
                            next: 0,
                        });
                    }
                } else {
                    on_stack.remove(&frame.id);
                    stack.pop();
                }
            }
        }

        None
    }

    /// Pass 2: every declared edge must be compatible end to end.
    fn check_type_consistency(&self, graph: &CompositionGraph) -> Vec<Violation> {
        let mut violations = Vec::new();

        for (source_id, target_id) in graph.edges() {
            let (Some(source), Some(target)) = (graph.get(&source_id), graph.get(&target_id))
            else {
                continue;
            };

            let result = self.checker.check(source, target);
            if !result.is_compatible() {
                violations.push(Violation {
                    rule: RuleViolation::TypeMismatch,
                    severity: Severity::High,
                    nodes: vec![source_id, target_id],
                    message: format!("type mismatch: {} -> {}", source.name, target.name),
                });
            }
        }

        violations
    }

    /// Pass 3: trust floor is critical; the band just above it is a warning.
    fn check_trust(
        &self,
        graph: &CompositionGraph,
        violations: &mut Vec<Violation>,
        warnings: &mut Vec<String>,
    ) {
        let floor = self.checker.config().trust_floor;
        for record in graph.records() {
            if record.trust_score < floor {
                violations.push(Violation {
                    rule: RuleViolation::TrustViolation,
                    severity: Severity::Critical,
                    nodes: vec![record.id.clone()],
                    message: format!(
                        "block {} has trust score below minimum ({:.2})",
                        record.name, record.trust_score
                    ),
                });
            } else if record.trust_score < LOW_TRUST_WARNING {
                warnings.push(format!(
                    "block {} has low trust score ({:.2})",
                    record.name, record.trust_score
                ));
            }
        }
    }

    /// Pass 4: structural checks -- orphans and unreachable nodes.
    fn check_structure(&self, graph: &CompositionGraph) -> Vec<Violation> {
        let mut violations = Vec::new();

        if graph.node_count() > 1 {
            for id in graph.block_ids() {
                if graph.is_isolated(id) {
                    violations.push(Violation {
                        rule: RuleViolation::OrphanNode,
                        severity: Severity::Medium,
                        nodes: vec![id.clone()],
                        message: format!("orphan node with no connections: {}", id.short()),
                    });
                }
            }
        }

        if !graph.entry_points().is_empty() {
            let reachable = self.reachable_from(graph, graph.entry_points());
            for id in graph.block_ids() {
                if !reachable.contains(id) {
                    violations.push(Violation {
                        rule: RuleViolation::UnreachableNode,
                        severity: Severity::Medium,
                        nodes: vec![id.clone()],
                        message: format!("unreachable node: {}", id.short()),
                    });
                }
            }
        }

        violations
    }

    /// Breadth-first reachability from the entry points.
    fn reachable_from(&self, graph: &CompositionGraph, starts: &[BlockId]) -> HashSet<BlockId> {
        let mut reachable: HashSet<BlockId> = HashSet::new();
        let mut queue: VecDeque<BlockId> = starts.iter().cloned().collect();

        while let Some(id) = queue.pop_front() {
            if !reachable.insert(id.clone()) {
                continue;
            }
            for successor in graph.successors(&id) {
                if !reachable.contains(&successor) {
                    queue.push_back(successor);
                }
            }
        }

        reachable
    }

    /// Pass 5: a block that can fail must not feed a successor declaring it
    /// cannot fail.
    fn check_error_handling(&self, graph: &CompositionGraph) -> Vec<Violation> {
        let mut violations = Vec::new();

        for record in graph.records() {
            if !record.can_fail {
                continue;
            }
            for successor_id in graph.successors(&record.id) {
                let Some(successor) = graph.get(&successor_id) else {
                    continue;
                };
                if !successor.can_fail {
                    violations.push(Violation {
                        rule: RuleViolation::ErrorNotHandled,
                        severity: Severity::Medium,
                        nodes: vec![record.id.clone(), successor_id],
                        message: format!(
                            "block {} can fail but successor {} does not handle errors",
                            record.name, successor.name
                        ),
                    });
                }
            }
        }

        violations
    }

    fn graph_trust(&self, graph: &CompositionGraph) -> f64 {
        if graph.node_count() == 0 {
            return 0.0;
        }
        let total: f64 = graph.records().map(|r| r.trust_score).sum();
        total / graph.node_count() as f64
    }

    /// Builds a composition graph from records.
    ///
    /// Without edges the blocks form a trivial linear chain (consecutive
    /// edges, first is the entry, last the exit). With edges, entries are the
    /// nodes with no incoming edge and exits the nodes with no outgoing edge.
    pub fn create_graph(
        &self,
        blocks: Vec<BlockRecord>,
        edges: Option<Vec<(BlockId, BlockId)>>,
    ) -> Result<CompositionGraph, ComposeError> {
        let mut graph = CompositionGraph::new();
        let ids: Vec<BlockId> = blocks.iter().map(|b| b.id.clone()).collect();
        for block in blocks {
            graph.add_block(block)?;
        }

        match edges {
            Some(edges) => {
                let sources: HashSet<&BlockId> = edges.iter().map(|(s, _)| s).collect();
                let targets: HashSet<&BlockId> = edges.iter().map(|(_, t)| t).collect();
                for (source, target) in &edges {
                    graph.add_edge(source, target)?;
                }
                graph.set_entry_points(
                    ids.iter()
                        .filter(|id| !targets.contains(id))
                        .cloned()
                        .collect(),
                );
                graph.set_exit_points(
                    ids.iter()
                        .filter(|id| !sources.contains(id))
                        .cloned()
                        .collect(),
                );
            }
            None => {
                for pair in ids.windows(2) {
                    graph.add_edge(&pair[0], &pair[1])?;
                }
                if let Some(first) = ids.first() {
                    graph.set_entry_points(vec![first.clone()]);
                }
                if let Some(last) = ids.last() {
                    graph.set_exit_points(vec![last.clone()]);
                }
            }
        }

        Ok(graph)
    }
}
