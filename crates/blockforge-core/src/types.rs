//! The closed block type system.
//!
//! Block interfaces declare parameter types from a fixed set of nine
//! [`DataType`] variants. Compatibility between them is governed by a fixed
//! matrix in the composition layer, not structural subtyping.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Data types a block interface may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Integer,
    Float,
    String,
    Boolean,
    List,
    Dict,
    Bytes,
    None,
    Any,
}

impl DataType {
    /// The lowercase token used in signatures and serialized records.
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Integer => "integer",
            DataType::Float => "float",
            DataType::String => "string",
            DataType::Boolean => "boolean",
            DataType::List => "list",
            DataType::Dict => "dict",
            DataType::Bytes => "bytes",
            DataType::None => "none",
            DataType::Any => "any",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DataType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "integer" => Ok(DataType::Integer),
            "float" => Ok(DataType::Float),
            "string" => Ok(DataType::String),
            "boolean" => Ok(DataType::Boolean),
            "list" => Ok(DataType::List),
            "dict" => Ok(DataType::Dict),
            "bytes" => Ok(DataType::Bytes),
            "none" => Ok(DataType::None),
            "any" => Ok(DataType::Any),
            other => Err(CoreError::UnknownDataType {
                token: other.to_string(),
            }),
        }
    }
}

/// Declared purity level of a block's logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurityLevel {
    /// No side effects, output depends only on inputs.
    Pure,
    /// Side effects exist but the output is still a function of the inputs.
    DeterministicWithSideEffects,
    /// Output may vary between calls with identical inputs.
    NonDeterministic,
}

impl PurityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurityLevel::Pure => "pure",
            PurityLevel::DeterministicWithSideEffects => "deterministic_with_side_effects",
            PurityLevel::NonDeterministic => "non_deterministic",
        }
    }
}

impl fmt::Display for PurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PurityLevel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pure" => Ok(PurityLevel::Pure),
            "deterministic_with_side_effects" => {
                Ok(PurityLevel::DeterministicWithSideEffects)
            }
            "non_deterministic" => Ok(PurityLevel::NonDeterministic),
            other => Err(CoreError::UnknownPurity {
                token: other.to_string(),
            }),
        }
    }
}
