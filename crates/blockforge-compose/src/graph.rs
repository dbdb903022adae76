//! The composition graph container.
//!
//! [`CompositionGraph`] holds block records as nodes of a directed
//! `StableGraph`, with a synchronized identity index mapping [`BlockId`] to
//! the petgraph node. All mutations go through `CompositionGraph` methods so
//! the graph and the index can never drift apart. Traversal helpers return
//! ids in edge-insertion order, which keeps downstream validation
//! deterministic.

use indexmap::IndexMap;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableGraph;
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use petgraph::{Directed, Direction};
use serde::{Deserialize, Serialize};

use blockforge_core::{BlockId, BlockRecord};

use crate::error::ComposeError;

/// A directed graph of blocks whose edges mean "output feeds input".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompositionGraph {
    graph: StableGraph<BlockRecord, (), Directed, u32>,
    /// Identity index, kept in sync with the graph, insertion-ordered.
    indices: IndexMap<BlockId, NodeIndex<u32>>,
    entry_points: Vec<BlockId>,
    exit_points: Vec<BlockId>,
}

impl CompositionGraph {
    pub fn new() -> Self {
        CompositionGraph::default()
    }

    /// Adds a block as a graph node.
    pub fn add_block(&mut self, record: BlockRecord) -> Result<(), ComposeError> {
        if self.indices.contains_key(&record.id) {
            return Err(ComposeError::DuplicateBlock {
                id: record.id.clone(),
            });
        }
        let id = record.id.clone();
        let idx = self.graph.add_node(record);
        self.indices.insert(id, idx);
        Ok(())
    }

    /// Adds a directed edge. Both endpoints must already be in the graph.
    pub fn add_edge(&mut self, source: &BlockId, target: &BlockId) -> Result<(), ComposeError> {
        let source_idx = self.index_of(source)?;
        let target_idx = self.index_of(target)?;
        self.graph.add_edge(source_idx, target_idx, ());
        Ok(())
    }

    fn index_of(&self, id: &BlockId) -> Result<NodeIndex<u32>, ComposeError> {
        self.indices
            .get(id)
            .copied()
            .ok_or_else(|| ComposeError::UnknownBlock { id: id.clone() })
    }

    /// Looks up a block record by identity.
    pub fn get(&self, id: &BlockId) -> Option<&BlockRecord> {
        self.indices.get(id).map(|idx| &self.graph[*idx])
    }

    /// Block ids in insertion order.
    pub fn block_ids(&self) -> impl Iterator<Item = &BlockId> {
        self.indices.keys()
    }

    /// Block records in insertion order.
    pub fn records(&self) -> impl Iterator<Item = &BlockRecord> {
        self.indices.values().map(|idx| &self.graph[*idx])
    }

    /// Edges as `(source, target)` id pairs, in insertion order.
    pub fn edges(&self) -> Vec<(BlockId, BlockId)> {
        self.graph
            .edge_references()
            .map(|edge| {
                (
                    self.graph[edge.source()].id.clone(),
                    self.graph[edge.target()].id.clone(),
                )
            })
            .collect()
    }

    /// Successor ids of a block, in edge-insertion order.
    pub fn successors(&self, id: &BlockId) -> Vec<BlockId> {
        self.neighbor_ids(id, Direction::Outgoing)
    }

    /// Predecessor ids of a block, in edge-insertion order.
    pub fn predecessors(&self, id: &BlockId) -> Vec<BlockId> {
        self.neighbor_ids(id, Direction::Incoming)
    }

    fn neighbor_ids(&self, id: &BlockId, direction: Direction) -> Vec<BlockId> {
        let Some(idx) = self.indices.get(id) else {
            return Vec::new();
        };
        // petgraph iterates neighbors most-recent-edge first; reverse to get
        // insertion order.
        let mut ids: Vec<BlockId> = self
            .graph
            .neighbors_directed(*idx, direction)
            .map(|n| self.graph[n].id.clone())
            .collect();
        ids.reverse();
        ids
    }

    /// `true` if the block has no edges in either direction.
    pub fn is_isolated(&self, id: &BlockId) -> bool {
        match self.indices.get(id) {
            Some(idx) => {
                self.graph
                    .neighbors_directed(*idx, Direction::Outgoing)
                    .next()
                    .is_none()
                    && self
                        .graph
                        .neighbors_directed(*idx, Direction::Incoming)
                        .next()
                        .is_none()
            }
            None => true,
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn entry_points(&self) -> &[BlockId] {
        &self.entry_points
    }

    pub fn exit_points(&self) -> &[BlockId] {
        &self.exit_points
    }

    pub fn set_entry_points(&mut self, entries: Vec<BlockId>) {
        self.entry_points = entries;
    }

    pub fn set_exit_points(&mut self, exits: Vec<BlockId>) {
        self.exit_points = exits;
    }
}
