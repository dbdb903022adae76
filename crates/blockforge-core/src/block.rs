//! The block record data model.
//!
//! A [`BlockRecord`] is the catalog's view of one pure-function unit: its
//! identity hash, human-readable name, typed interface, declared constraints,
//! and trust score. Records are created at ingestion and read-only inside the
//! core; normalization and deduplication produce derived records with explicit
//! alias metadata instead of rewriting in place.

use serde::{Deserialize, Serialize};

use crate::id::BlockId;
use crate::types::{DataType, PurityLevel};

/// A typed interface parameter (input or output).
///
/// `aliases` and `original_name` are empty on freshly ingested records; the
/// normalizer fills them so old parameter names remain valid after renaming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub data_type: DataType,
    /// Former names this parameter still answers to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    /// Name the parameter carried before normalization, when renamed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
}

impl Param {
    /// Creates a parameter with no alias metadata.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Param {
            name: name.into(),
            data_type,
            aliases: Vec::new(),
            original_name: None,
        }
    }
}

/// Where a block's source text came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>) -> Self {
        SourceLocation {
            file: file.into(),
            line: None,
        }
    }
}

/// A cataloged block: identity, interface, constraints, trust.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockRecord {
    /// Content-derived identity hash, globally unique.
    pub id: BlockId,
    pub name: String,
    pub category: String,
    /// Ordered input parameters. Order is part of the structural signature.
    pub inputs: Vec<Param>,
    /// Ordered output parameters.
    pub outputs: Vec<Param>,
    pub purity: PurityLevel,
    pub deterministic: bool,
    pub can_fail: bool,
    /// Confidence in the block's correctness/safety, in [0, 1].
    pub trust_score: f64,
    #[serde(default)]
    pub source: SourceLocation,
    /// Name the block carried before a namespace rename, when renamed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
}

impl BlockRecord {
    /// Returns `true` if the block declares no side effects at all.
    pub fn is_pure(&self) -> bool {
        self.purity == PurityLevel::Pure
    }

    /// Builder-style constructor with the common defaults: pure,
    /// deterministic, infallible, empty category.
    pub fn new(id: impl Into<BlockId>, name: impl Into<String>) -> Self {
        BlockRecord {
            id: id.into(),
            name: name.into(),
            category: String::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            purity: PurityLevel::Pure,
            deterministic: true,
            can_fail: false,
            trust_score: 0.5,
            source: SourceLocation::default(),
            original_name: None,
        }
    }

    pub fn with_inputs(mut self, inputs: Vec<Param>) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn with_outputs(mut self, outputs: Vec<Param>) -> Self {
        self.outputs = outputs;
        self
    }

    pub fn with_trust(mut self, trust_score: f64) -> Self {
        self.trust_score = trust_score;
        self
    }

    pub fn with_purity(mut self, purity: PurityLevel) -> Self {
        self.purity = purity;
        self
    }

    pub fn with_deterministic(mut self, deterministic: bool) -> Self {
        self.deterministic = deterministic;
        self
    }

    pub fn with_can_fail(mut self, can_fail: bool) -> Self {
        self.can_fail = can_fail;
        self
    }

    pub fn with_source(mut self, source: SourceLocation) -> Self {
        self.source = source;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }
}
