//! Parameter name resolution against the canonical vocabulary.
//!
//! [`ParameterMapper::resolve`] maps a single `(name, data type)` pair to a
//! [`ParameterMapping`] with a confidence level. Resolution never fails: the
//! weakest outcome is an identity mapping flagged as unmapped. The only
//! configuration -- the caller-supplied custom table -- is fixed at
//! construction, so the same inputs always yield the same mapping within a
//! run.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use blockforge_core::{BlockId, DataType, Param};

use crate::vocabulary::CanonicalVocabulary;

/// Confidence level of a parameter mapping, weakest first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum MappingConfidence {
    None,
    Low,
    Medium,
    High,
    Exact,
}

/// A resolved mapping from an original to a canonical parameter name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterMapping {
    pub original_name: String,
    pub canonical_name: String,
    pub data_type: DataType,
    pub confidence: MappingConfidence,
    pub reason: String,
}

/// Per-block outcome of mapping an input interface.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockMappingResult {
    pub block_id: BlockId,
    pub block_name: String,
    /// Parameters whose canonical name differs from the original.
    pub mappings: Vec<ParameterMapping>,
    /// Parameters already carrying their canonical name.
    pub unchanged: Vec<String>,
    /// Parameters no rule could place, left untouched.
    pub unmapped: Vec<String>,
}

impl BlockMappingResult {
    pub fn has_changes(&self) -> bool {
        !self.mappings.is_empty()
    }

    pub fn all_mapped(&self) -> bool {
        self.unmapped.is_empty()
    }
}

/// Aggregate mapping statistics over many block results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingStats {
    pub total_parameters: usize,
    pub mapped: usize,
    pub unchanged: usize,
    pub unmapped: usize,
    pub exact: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    /// Percentage of parameters that received a rename, rounded to 0.1.
    pub mapping_rate: f64,
}

/// Maps parameter names to canonical equivalents.
pub struct ParameterMapper<'v> {
    vocab: &'v CanonicalVocabulary,
    /// lowercase original -> canonical, fixed at construction.
    custom: HashMap<String, String>,
}

impl<'v> ParameterMapper<'v> {
    pub fn new(vocab: &'v CanonicalVocabulary) -> Self {
        ParameterMapper {
            vocab,
            custom: HashMap::new(),
        }
    }

    /// Installs caller-supplied overrides. Keys are matched case-insensitively.
    /// Consumes the builder so the table cannot change once resolution starts.
    pub fn with_custom_mappings<I, S>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        for (original, canonical) in pairs {
            self.custom
                .insert(original.into().to_lowercase(), canonical.into());
        }
        self
    }

    /// Resolves one parameter name. Never fails; the priority chain is:
    /// custom table (exact) > already canonical (exact) > vocabulary alias
    /// (high) > suffix/prefix heuristics (medium) > identity (none).
    pub fn resolve(&self, name: &str, data_type: DataType) -> ParameterMapping {
        let lower = name.to_lowercase();

        if let Some(canonical) = self.custom.get(&lower) {
            return ParameterMapping {
                original_name: name.to_string(),
                canonical_name: canonical.clone(),
                data_type,
                confidence: MappingConfidence::Exact,
                reason: "custom mapping".to_string(),
            };
        }

        if self.vocab.is_canonical(name) {
            return ParameterMapping {
                original_name: name.to_string(),
                canonical_name: name.to_string(),
                data_type,
                confidence: MappingConfidence::Exact,
                reason: "already canonical".to_string(),
            };
        }

        if let Some(canonical) = self.vocab.canonical_for(name, data_type) {
            return ParameterMapping {
                original_name: name.to_string(),
                canonical_name: canonical.to_string(),
                data_type,
                confidence: MappingConfidence::High,
                reason: format!("alias for '{canonical}'"),
            };
        }

        if let Some(inferred) = self.infer(name, &lower) {
            return inferred;
        }

        ParameterMapping {
            original_name: name.to_string(),
            canonical_name: name.to_string(),
            data_type,
            confidence: MappingConfidence::None,
            reason: "no mapping found".to_string(),
        }
    }

    /// Suffix/prefix heuristics for names the vocabulary does not know.
    fn infer(&self, name: &str, lower: &str) -> Option<ParameterMapping> {
        const TEXT_PATTERNS: [&str; 5] = ["_text", "_string", "_str", "_input", "_content"];
        for pattern in TEXT_PATTERNS {
            let as_prefix = format!("{}_", &pattern[1..]);
            if lower.ends_with(pattern) || lower.starts_with(&as_prefix) {
                return Some(ParameterMapping {
                    original_name: name.to_string(),
                    canonical_name: "text".to_string(),
                    data_type: DataType::String,
                    confidence: MappingConfidence::Medium,
                    reason: format!("inferred from pattern '{pattern}'"),
                });
            }
        }

        const COUNT_PATTERNS: [&str; 3] = ["_count", "_num", "_number"];
        for pattern in COUNT_PATTERNS {
            if lower.ends_with(pattern) {
                return Some(ParameterMapping {
                    original_name: name.to_string(),
                    canonical_name: "n".to_string(),
                    data_type: DataType::Integer,
                    confidence: MappingConfidence::Medium,
                    reason: format!("inferred from pattern '{pattern}'"),
                });
            }
        }
        const INDEX_PATTERNS: [&str; 2] = ["_idx", "_index"];
        for pattern in INDEX_PATTERNS {
            if lower.ends_with(pattern) {
                return Some(ParameterMapping {
                    original_name: name.to_string(),
                    canonical_name: "index".to_string(),
                    data_type: DataType::Integer,
                    confidence: MappingConfidence::Medium,
                    reason: format!("inferred from pattern '{pattern}'"),
                });
            }
        }

        const LIST_PATTERNS: [&str; 4] = ["_list", "_items", "_array", "_values"];
        for pattern in LIST_PATTERNS {
            if lower.ends_with(pattern) {
                return Some(ParameterMapping {
                    original_name: name.to_string(),
                    canonical_name: "items".to_string(),
                    data_type: DataType::List,
                    confidence: MappingConfidence::Medium,
                    reason: format!("inferred from pattern '{pattern}'"),
                });
            }
        }

        None
    }

    /// Maps every input parameter of one block interface.
    pub fn map_block_interface(
        &self,
        block_id: &BlockId,
        block_name: &str,
        inputs: &[Param],
    ) -> BlockMappingResult {
        let mut result = BlockMappingResult {
            block_id: block_id.clone(),
            block_name: block_name.to_string(),
            ..Default::default()
        };

        for param in inputs {
            let mapping = self.resolve(&param.name, param.data_type);
            if mapping.confidence == MappingConfidence::None {
                result.unmapped.push(param.name.clone());
            } else if mapping.original_name == mapping.canonical_name {
                result.unchanged.push(param.name.clone());
            } else {
                result.mappings.push(mapping);
            }
        }

        result
    }
}

/// Aggregates statistics over a batch of mapping results.
pub fn mapper_statistics(results: &[BlockMappingResult]) -> MappingStats {
    let mut stats = MappingStats::default();

    for result in results {
        stats.total_parameters +=
            result.mappings.len() + result.unchanged.len() + result.unmapped.len();
        stats.mapped += result.mappings.len();
        stats.unchanged += result.unchanged.len();
        stats.unmapped += result.unmapped.len();

        for mapping in &result.mappings {
            match mapping.confidence {
                MappingConfidence::Exact => stats.exact += 1,
                MappingConfidence::High => stats.high += 1,
                MappingConfidence::Medium => stats.medium += 1,
                MappingConfidence::Low => stats.low += 1,
                MappingConfidence::None => {}
            }
        }
    }

    stats.mapping_rate = if stats.total_parameters > 0 {
        (stats.mapped as f64 / stats.total_parameters as f64 * 1000.0).round() / 10.0
    } else {
        0.0
    };

    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab() -> CanonicalVocabulary {
        CanonicalVocabulary::default()
    }

    // -----------------------------------------------------------------------
    // resolve priority chain
    // -----------------------------------------------------------------------

    #[test]
    fn custom_mapping_wins_over_everything() {
        let vocab = vocab();
        let mapper = ParameterMapper::new(&vocab)
            .with_custom_mappings([("txt", "message_body")]);

        // "txt" is a vocabulary alias of "text", but custom wins.
        let mapping = mapper.resolve("txt", DataType::String);
        assert_eq!(mapping.canonical_name, "message_body");
        assert_eq!(mapping.confidence, MappingConfidence::Exact);
        assert_eq!(mapping.reason, "custom mapping");
    }

    #[test]
    fn custom_mapping_matches_case_insensitively() {
        let vocab = vocab();
        let mapper = ParameterMapper::new(&vocab).with_custom_mappings([("MyParam", "text")]);

        let mapping = mapper.resolve("myparam", DataType::String);
        assert_eq!(mapping.canonical_name, "text");
        assert_eq!(mapping.confidence, MappingConfidence::Exact);
    }

    #[test]
    fn canonical_name_maps_to_itself_exactly() {
        let vocab = vocab();
        let mapper = ParameterMapper::new(&vocab);

        let mapping = mapper.resolve("text", DataType::String);
        assert_eq!(mapping.canonical_name, "text");
        assert_eq!(mapping.confidence, MappingConfidence::Exact);
        assert_eq!(mapping.reason, "already canonical");
    }

    #[test]
    fn alias_resolves_with_high_confidence() {
        let vocab = vocab();
        let mapper = ParameterMapper::new(&vocab);

        let mapping = mapper.resolve("txt", DataType::String);
        assert_eq!(mapping.canonical_name, "text");
        assert_eq!(mapping.confidence, MappingConfidence::High);
    }

    #[test]
    fn suffix_heuristics_infer_medium_confidence() {
        let vocab = vocab();
        let mapper = ParameterMapper::new(&vocab);

        let text = mapper.resolve("raw_input", DataType::Any);
        assert_eq!(text.canonical_name, "text");
        assert_eq!(text.data_type, DataType::String);
        assert_eq!(text.confidence, MappingConfidence::Medium);

        let count = mapper.resolve("word_count", DataType::Any);
        assert_eq!(count.canonical_name, "n");
        assert_eq!(count.data_type, DataType::Integer);

        let index = mapper.resolve("row_idx", DataType::Any);
        assert_eq!(index.canonical_name, "index");

        let items = mapper.resolve("token_list", DataType::Any);
        assert_eq!(items.canonical_name, "items");
        assert_eq!(items.data_type, DataType::List);
    }

    #[test]
    fn prefix_heuristic_covers_text_patterns() {
        let vocab = vocab();
        let mapper = ParameterMapper::new(&vocab);

        let mapping = mapper.resolve("string_to_parse", DataType::Any);
        assert_eq!(mapping.canonical_name, "text");
        assert_eq!(mapping.confidence, MappingConfidence::Medium);
    }

    #[test]
    fn unmappable_name_yields_identity_none() {
        // "cnt": no custom mapping, no registered alias, no matching
        // suffix heuristic.
        let vocab = vocab();
        let mapper = ParameterMapper::new(&vocab);

        let mapping = mapper.resolve("cnt", DataType::Integer);
        assert_eq!(mapping.original_name, "cnt");
        assert_eq!(mapping.canonical_name, "cnt");
        assert_eq!(mapping.confidence, MappingConfidence::None);
        assert_eq!(mapping.reason, "no mapping found");
    }

    #[test]
    fn resolution_is_deterministic_within_a_run() {
        let vocab = vocab();
        let mapper = ParameterMapper::new(&vocab);

        let first = mapper.resolve("delim", DataType::String);
        let second = mapper.resolve("delim", DataType::String);
        assert_eq!(first, second);
    }

    // -----------------------------------------------------------------------
    // map_block_interface
    // -----------------------------------------------------------------------

    #[test]
    fn interface_mapping_partitions_parameters() {
        let vocab = vocab();
        let mapper = ParameterMapper::new(&vocab);

        let inputs = vec![
            Param::new("text", DataType::String),  // unchanged
            Param::new("txt", DataType::String),   // mapped
            Param::new("cnt", DataType::Integer),  // unmapped
        ];
        let id = BlockId::from("b1");
        let result = mapper.map_block_interface(&id, "trim", &inputs);

        assert!(result.has_changes());
        assert!(!result.all_mapped());
        assert_eq!(result.mappings.len(), 1);
        assert_eq!(result.unchanged, vec!["text"]);
        assert_eq!(result.unmapped, vec!["cnt"]);
    }

    #[test]
    fn statistics_aggregate_across_results() {
        let vocab = vocab();
        let mapper = ParameterMapper::new(&vocab);
        let id = BlockId::from("b1");

        let results = vec![
            mapper.map_block_interface(
                &id,
                "a",
                &[
                    Param::new("txt", DataType::String),
                    Param::new("cnt", DataType::Integer),
                ],
            ),
            mapper.map_block_interface(
                &id,
                "b",
                &[
                    Param::new("text", DataType::String),
                    Param::new("item_list", DataType::List),
                ],
            ),
        ];

        let stats = mapper_statistics(&results);
        assert_eq!(stats.total_parameters, 4);
        assert_eq!(stats.mapped, 2);
        assert_eq!(stats.unchanged, 1);
        assert_eq!(stats.unmapped, 1);
        assert_eq!(stats.high, 1);
        assert_eq!(stats.medium, 1);
        assert_eq!(stats.mapping_rate, 50.0);
    }

    #[test]
    fn confidence_levels_are_ordered() {
        assert!(MappingConfidence::None < MappingConfidence::Low);
        assert!(MappingConfidence::Low < MappingConfidence::Medium);
        assert!(MappingConfidence::Medium < MappingConfidence::High);
        assert!(MappingConfidence::High < MappingConfidence::Exact);
    }

    #[test]
    fn mapping_serde_roundtrip() {
        let vocab = vocab();
        let mapper = ParameterMapper::new(&vocab);
        let mapping = mapper.resolve("txt", DataType::String);

        let json = serde_json::to_string(&mapping).unwrap();
        assert!(json.contains("\"confidence\":\"high\""));
        let back: ParameterMapping = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mapping);
    }
}
