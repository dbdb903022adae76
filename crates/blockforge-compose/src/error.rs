//! Error types for blockforge-compose.

use thiserror::Error;

use blockforge_core::BlockId;

/// Errors produced by composition graph construction.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// An edge endpoint references a block not present in the graph.
    #[error("unknown block in graph: {id}")]
    UnknownBlock { id: BlockId },

    /// A block with this identity is already in the graph.
    #[error("block already in graph: {id}")]
    DuplicateBlock { id: BlockId },
}
