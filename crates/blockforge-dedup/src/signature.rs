//! Structural signatures and duplicate grouping.
//!
//! A block's signature is its name plus the ordered `{index}:{name}:{type}`
//! tuples of its input parameters -- order matters, so swapping two parameters
//! produces a different signature. The [`SignatureHasher`] groups same-named
//! blocks into [`DuplicateGroup`]s for the policy engine. Signatures are used
//! only for grouping, never for execution.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use blockforge_core::{BlockId, BlockRecord};

/// Length of the hex digest kept from the blake3 hash of a signature.
const DIGEST_LEN: usize = 16;

/// A block's structural signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockSignature {
    pub block_id: BlockId,
    pub name: String,
    /// `|`-joined ordered parameter tuples, or `void` for no parameters.
    pub param_signature: String,
    pub source_file: String,
    pub trust_score: f64,
    /// Truncated blake3 hex digest of `{name}:{param_signature}`.
    pub digest: String,
}

impl BlockSignature {
    /// A signature is usable for grouping only if both parts are present.
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.param_signature.is_empty()
    }
}

/// Blocks sharing one name, in first-seen order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub name: String,
    pub members: Vec<BlockSignature>,
}

impl DuplicateGroup {
    pub fn count(&self) -> usize {
        self.members.len()
    }

    /// `true` iff member signatures are not all identical.
    pub fn has_signature_conflict(&self) -> bool {
        if self.members.len() < 2 {
            return false;
        }
        let first = &self.members[0].param_signature;
        self.members.iter().any(|m| &m.param_signature != first)
    }

    /// `true` iff at least two members share an identical signature.
    pub fn has_exact_duplicates(&self) -> bool {
        if self.members.len() < 2 {
            return false;
        }
        let mut seen = std::collections::HashSet::new();
        self.members
            .iter()
            .any(|m| !seen.insert(m.param_signature.as_str()))
    }

    /// The member with the highest trust score; ties go to the earliest.
    pub fn best_member(&self) -> Option<&BlockSignature> {
        let mut best: Option<&BlockSignature> = None;
        for member in &self.members {
            match best {
                Some(current) if member.trust_score <= current.trust_score => {}
                _ => best = Some(member),
            }
        }
        best
    }

    /// Members grouped by their parameter signature, in first-seen order.
    pub fn variants(&self) -> IndexMap<&str, Vec<&BlockSignature>> {
        let mut variants: IndexMap<&str, Vec<&BlockSignature>> = IndexMap::new();
        for member in &self.members {
            variants
                .entry(member.param_signature.as_str())
                .or_default()
                .push(member);
        }
        variants
    }
}

/// Duplicate-detection statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HasherStats {
    pub total_blocks: usize,
    pub unique_names: usize,
    pub duplicate_names: usize,
    pub signature_conflicts: usize,
    pub exact_duplicates: usize,
    pub blocks_affected: usize,
}

/// Computes block signatures and groups same-named blocks.
#[derive(Debug, Default)]
pub struct SignatureHasher {
    signatures: IndexMap<BlockId, BlockSignature>,
    /// name -> group, in first-seen order. That order is the tie-breaker for
    /// [`SignatureHasher::find_all_duplicates`].
    name_groups: IndexMap<String, DuplicateGroup>,
}

/// Computes the structural signature of a record.
///
/// Pure function of `(name, ordered input name:type pairs)`: permuting the
/// parameter order changes the result.
pub fn compute_signature(record: &BlockRecord) -> BlockSignature {
    let param_signature = if record.inputs.is_empty() {
        "void".to_string()
    } else {
        record
            .inputs
            .iter()
            .enumerate()
            .map(|(idx, p)| format!("{}:{}:{}", idx, p.name, p.data_type))
            .collect::<Vec<_>>()
            .join("|")
    };

    let sig_string = format!("{}:{}", record.name, param_signature);
    let digest = blake3::hash(sig_string.as_bytes())
        .to_hex()
        .as_str()[..DIGEST_LEN]
        .to_string();

    BlockSignature {
        block_id: record.id.clone(),
        name: record.name.clone(),
        param_signature,
        source_file: record.source.file.clone(),
        trust_score: record.trust_score,
        digest,
    }
}

impl SignatureHasher {
    pub fn new() -> Self {
        SignatureHasher::default()
    }

    /// Computes and records a block's signature.
    pub fn add(&mut self, record: &BlockRecord) -> BlockSignature {
        let sig = compute_signature(record);
        self.signatures.insert(sig.block_id.clone(), sig.clone());

        if !sig.name.is_empty() {
            self.name_groups
                .entry(sig.name.clone())
                .or_insert_with(|| DuplicateGroup {
                    name: sig.name.clone(),
                    members: Vec::new(),
                })
                .members
                .push(sig.clone());
        }

        sig
    }

    /// All names with more than one implementation, sorted by descending
    /// member count; ties keep first-seen order (stable sort).
    pub fn find_all_duplicates(&self) -> Vec<&DuplicateGroup> {
        let mut duplicates: Vec<&DuplicateGroup> = self
            .name_groups
            .values()
            .filter(|g| g.count() > 1)
            .collect();
        duplicates.sort_by(|a, b| b.count().cmp(&a.count()));
        duplicates
    }

    /// Duplicate groups whose members disagree on parameter signature.
    pub fn find_signature_conflicts(&self) -> Vec<&DuplicateGroup> {
        self.find_all_duplicates()
            .into_iter()
            .filter(|g| g.has_signature_conflict())
            .collect()
    }

    /// Duplicate groups containing at least one identical-signature pair.
    pub fn find_exact_duplicates(&self) -> Vec<&DuplicateGroup> {
        self.find_all_duplicates()
            .into_iter()
            .filter(|g| g.has_exact_duplicates())
            .collect()
    }

    pub fn statistics(&self) -> HasherStats {
        let all = self.find_all_duplicates();
        HasherStats {
            total_blocks: self.signatures.len(),
            unique_names: self.name_groups.len(),
            duplicate_names: all.len(),
            signature_conflicts: all.iter().filter(|g| g.has_signature_conflict()).count(),
            exact_duplicates: all.iter().filter(|g| g.has_exact_duplicates()).count(),
            blocks_affected: all.iter().map(|g| g.count()).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockforge_core::{DataType, Param, SourceLocation};

    fn record(id: &str, name: &str, inputs: &[(&str, DataType)], trust: f64) -> BlockRecord {
        BlockRecord::new(id, name)
            .with_inputs(
                inputs
                    .iter()
                    .map(|(n, t)| Param::new(*n, *t))
                    .collect(),
            )
            .with_trust(trust)
            .with_source(SourceLocation::new("sources/string_operations.rs"))
    }

    #[test]
    fn signature_encodes_ordered_params() {
        let block = record(
            "a",
            "pad",
            &[("text", DataType::String), ("width", DataType::Integer)],
            0.5,
        );
        let sig = compute_signature(&block);
        assert_eq!(sig.param_signature, "0:text:string|1:width:integer");
        assert_eq!(sig.digest.len(), 16);
        assert!(sig.is_complete());
    }

    #[test]
    fn empty_interface_signs_as_void() {
        let sig = compute_signature(&record("a", "now", &[], 0.5));
        assert_eq!(sig.param_signature, "void");
    }

    #[test]
    fn permuting_parameter_order_changes_the_signature() {
        let ab = record(
            "a",
            "f",
            &[("x", DataType::Integer), ("y", DataType::Float)],
            0.5,
        );
        let ba = record(
            "b",
            "f",
            &[("y", DataType::Float), ("x", DataType::Integer)],
            0.5,
        );
        let sig_ab = compute_signature(&ab);
        let sig_ba = compute_signature(&ba);
        assert_ne!(sig_ab.param_signature, sig_ba.param_signature);
        assert_ne!(sig_ab.digest, sig_ba.digest);
    }

    #[test]
    fn signature_is_a_pure_function_of_name_and_params() {
        let a = record("a", "f", &[("x", DataType::Integer)], 0.1);
        let b = record("b", "f", &[("x", DataType::Integer)], 0.9);
        // Identity and trust differ; signature string and digest do not.
        let sig_a = compute_signature(&a);
        let sig_b = compute_signature(&b);
        assert_eq!(sig_a.param_signature, sig_b.param_signature);
        assert_eq!(sig_a.digest, sig_b.digest);
    }

    #[test]
    fn groups_form_per_name_with_conflict_flags() {
        // Three same-named blocks: two exact duplicates plus one conflict.
        let mut hasher = SignatureHasher::new();
        hasher.add(&record("a", "normalize", &[("text", DataType::String)], 0.7));
        hasher.add(&record("b", "normalize", &[("text", DataType::String)], 0.9));
        hasher.add(&record("c", "normalize", &[("value", DataType::String)], 0.5));

        let duplicates = hasher.find_all_duplicates();
        assert_eq!(duplicates.len(), 1);
        let group = duplicates[0];
        assert_eq!(group.count(), 3);
        assert!(group.has_signature_conflict());
        assert!(group.has_exact_duplicates());
        assert_eq!(group.best_member().unwrap().block_id, "b".into());
        assert_eq!(group.variants().len(), 2);
    }

    #[test]
    fn groups_below_two_members_are_not_duplicates() {
        let mut hasher = SignatureHasher::new();
        hasher.add(&record("a", "solo", &[("text", DataType::String)], 0.7));
        assert!(hasher.find_all_duplicates().is_empty());

        let stats = hasher.statistics();
        assert_eq!(stats.total_blocks, 1);
        assert_eq!(stats.unique_names, 1);
        assert_eq!(stats.duplicate_names, 0);
    }

    #[test]
    fn identical_signatures_conflict_free() {
        let mut hasher = SignatureHasher::new();
        hasher.add(&record("a", "dup", &[("text", DataType::String)], 0.7));
        hasher.add(&record("b", "dup", &[("text", DataType::String)], 0.8));

        let duplicates = hasher.find_all_duplicates();
        let group = duplicates[0];
        assert!(!group.has_signature_conflict());
        assert!(group.has_exact_duplicates());
    }

    #[test]
    fn duplicate_ordering_is_by_count_then_first_seen() {
        let mut hasher = SignatureHasher::new();
        // "beta" first but smaller; "alpha" later but larger; "gamma" ties beta.
        hasher.add(&record("b1", "beta", &[], 0.5));
        hasher.add(&record("b2", "beta", &[], 0.5));
        hasher.add(&record("g1", "gamma", &[], 0.5));
        hasher.add(&record("g2", "gamma", &[], 0.5));
        hasher.add(&record("a1", "alpha", &[], 0.5));
        hasher.add(&record("a2", "alpha", &[], 0.5));
        hasher.add(&record("a3", "alpha", &[], 0.5));

        let names: Vec<&str> = hasher
            .find_all_duplicates()
            .iter()
            .map(|g| g.name.as_str())
            .collect();
        assert_eq!(names, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn best_member_ties_go_to_first_in_input_order() {
        let mut hasher = SignatureHasher::new();
        hasher.add(&record("first", "f", &[], 0.9));
        hasher.add(&record("second", "f", &[], 0.9));

        let duplicates = hasher.find_all_duplicates();
        assert_eq!(
            duplicates[0].best_member().unwrap().block_id,
            "first".into()
        );
    }

    #[test]
    fn conflict_and_exact_filters_partition_duplicates() {
        let mut hasher = SignatureHasher::new();
        // Conflict-only group.
        hasher.add(&record("a", "conflict", &[("x", DataType::Integer)], 0.5));
        hasher.add(&record("b", "conflict", &[("y", DataType::Integer)], 0.5));
        // Exact-only group.
        hasher.add(&record("c", "exact", &[("x", DataType::Integer)], 0.5));
        hasher.add(&record("d", "exact", &[("x", DataType::Integer)], 0.5));

        let conflicts = hasher.find_signature_conflicts();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].name, "conflict");

        let exact = hasher.find_exact_duplicates();
        assert_eq!(exact.len(), 1);
        assert_eq!(exact[0].name, "exact");

        let stats = hasher.statistics();
        assert_eq!(stats.duplicate_names, 2);
        assert_eq!(stats.signature_conflicts, 1);
        assert_eq!(stats.exact_duplicates, 1);
        assert_eq!(stats.blocks_affected, 4);
    }
}
