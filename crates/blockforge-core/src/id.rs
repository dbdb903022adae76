//! Stable block identity.
//!
//! A [`BlockId`] wraps the content-derived hash assigned at ingestion. The
//! core never re-derives it; it is an opaque, globally unique key into the
//! catalog.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Content-derived block identity hash.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct BlockId(pub String);

impl BlockId {
    /// Creates a block id from any string-like value.
    pub fn new(hash: impl Into<String>) -> Self {
        BlockId(hash.into())
    }

    /// Returns the full hash string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns a 12-character prefix for log and report messages.
    pub fn short(&self) -> &str {
        let end = self.0.len().min(12);
        &self.0[..end]
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BlockId {
    fn from(s: &str) -> Self {
        BlockId(s.to_string())
    }
}

impl From<String> for BlockId {
    fn from(s: String) -> Self {
        BlockId(s)
    }
}
