//! Core error types for blockforge-core.
//!
//! Uses `thiserror` for structured, matchable error variants. Only
//! programmer-error-class problems surface here; data-quality problems are
//! returned as structured results by the analysis crates.

use thiserror::Error;

use crate::id::BlockId;

/// Core errors produced by the blockforge-core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A data type token outside the closed set was encountered.
    #[error("unknown data type: '{token}'")]
    UnknownDataType { token: String },

    /// A purity token outside the closed set was encountered.
    #[error("unknown purity level: '{token}'")]
    UnknownPurity { token: String },

    /// A block id was not found in the catalog.
    #[error("block not found: {id}")]
    BlockNotFound { id: BlockId },

    /// Inserting a record whose id already exists in the catalog.
    #[error("duplicate block id: {id}")]
    DuplicateBlockId { id: BlockId },
}
