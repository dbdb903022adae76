//! The canonical parameter vocabulary.
//!
//! A [`CanonicalVocabulary`] is an immutable table mapping each data type to
//! its preferred parameter names and their known aliases. It is built once
//! (usually via [`Default`]) and passed by reference into the mapper -- never
//! mutated after construction, so lookups are reproducible within a run.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use blockforge_core::DataType;

/// Immutable canonical-name table with per-type alias lookup.
#[derive(Debug, Clone)]
pub struct CanonicalVocabulary {
    /// data type -> canonical name -> aliases, in declaration order.
    table: IndexMap<DataType, IndexMap<String, Vec<String>>>,
    /// canonical name -> the data type it was declared under (first wins).
    canonical_types: HashMap<String, DataType>,
    /// data type -> (canonical or alias) -> canonical.
    alias_index: IndexMap<DataType, HashMap<String, String>>,
}

impl CanonicalVocabulary {
    /// Builds a vocabulary from `(data type, canonical, aliases)` entries.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (DataType, S, Vec<S>)>,
        S: Into<String>,
    {
        let mut table: IndexMap<DataType, IndexMap<String, Vec<String>>> = IndexMap::new();
        let mut canonical_types = HashMap::new();
        let mut alias_index: IndexMap<DataType, HashMap<String, String>> = IndexMap::new();

        for (data_type, canonical, aliases) in entries {
            let canonical: String = canonical.into();
            let aliases: Vec<String> = aliases.into_iter().map(Into::into).collect();

            canonical_types
                .entry(canonical.clone())
                .or_insert(data_type);

            let index = alias_index.entry(data_type).or_default();
            index.insert(canonical.clone(), canonical.clone());
            for alias in &aliases {
                index.insert(alias.clone(), canonical.clone());
            }

            table
                .entry(data_type)
                .or_default()
                .insert(canonical, aliases);
        }

        CanonicalVocabulary {
            table,
            canonical_types,
            alias_index,
        }
    }

    /// Resolves a name to its canonical form for the given data type.
    ///
    /// Lookup order: the type's own alias table, then the `any` table, then
    /// every other type's table in declaration order (type-agnostic fallback).
    pub fn canonical_for(&self, name: &str, data_type: DataType) -> Option<&str> {
        if let Some(index) = self.alias_index.get(&data_type) {
            if let Some(canonical) = index.get(name) {
                return Some(canonical);
            }
        }
        if data_type != DataType::Any {
            if let Some(index) = self.alias_index.get(&DataType::Any) {
                if let Some(canonical) = index.get(name) {
                    return Some(canonical);
                }
            }
        }
        for (ty, index) in &self.alias_index {
            if *ty == data_type || *ty == DataType::Any {
                continue;
            }
            if let Some(canonical) = index.get(name) {
                return Some(canonical);
            }
        }
        None
    }

    /// Returns `true` if the name is a canonical name for any data type.
    pub fn is_canonical(&self, name: &str) -> bool {
        self.canonical_types.contains_key(name)
    }

    /// Returns the declared aliases of a canonical name.
    ///
    /// With a data type, only that type's declaration is consulted; without
    /// one, the first declaring type wins.
    pub fn aliases_of(&self, canonical: &str, data_type: Option<DataType>) -> &[String] {
        match data_type {
            Some(ty) => self
                .table
                .get(&ty)
                .and_then(|m| m.get(canonical))
                .map(Vec::as_slice)
                .unwrap_or(&[]),
            None => self
                .table
                .values()
                .find_map(|m| m.get(canonical))
                .map(Vec::as_slice)
                .unwrap_or(&[]),
        }
    }

    /// Returns every valid name (canonical + aliases) for a data type.
    pub fn valid_names(&self, data_type: DataType) -> HashSet<&str> {
        let mut valid = HashSet::new();
        if let Some(map) = self.table.get(&data_type) {
            for (canonical, aliases) in map {
                valid.insert(canonical.as_str());
                for alias in aliases {
                    valid.insert(alias.as_str());
                }
            }
        }
        valid
    }
}

impl Default for CanonicalVocabulary {
    /// The built-in vocabulary covering the common parameter roles per type.
    fn default() -> Self {
        use DataType::*;

        fn owned(names: &[&str]) -> Vec<std::string::String> {
            names.iter().map(|s| s.to_string()).collect()
        }

        let entries: Vec<(DataType, std::string::String, Vec<std::string::String>)> = vec![
            // string
            (String, "text".into(), owned(&["s", "str", "string", "input", "value", "txt", "content", "message"])),
            (String, "pattern".into(), owned(&["regex", "regexp", "re", "pat"])),
            (String, "separator".into(), owned(&["sep", "delimiter", "delim", "split_char"])),
            (String, "prefix".into(), owned(&["pre", "start"])),
            (String, "suffix".into(), owned(&["suf", "end", "post"])),
            (String, "char".into(), owned(&["character", "c", "fill_char", "pad_char"])),
            (String, "replacement".into(), owned(&["repl", "replace_with", "new_value"])),
            (String, "encoding".into(), owned(&["enc", "charset"])),
            // integer
            (Integer, "n".into(), owned(&["num", "number", "count", "amount", "qty"])),
            (Integer, "index".into(), owned(&["idx", "i", "pos", "position"])),
            (Integer, "start".into(), owned(&["begin", "from_idx", "start_idx", "offset"])),
            (Integer, "end".into(), owned(&["stop", "to_idx", "end_idx", "limit"])),
            (Integer, "width".into(), owned(&["length", "size", "len", "pad_length"])),
            (Integer, "precision".into(), owned(&["decimals", "decimal_places", "digits"])),
            (Integer, "base".into(), owned(&["radix"])),
            (Integer, "attempt".into(), owned(&["retry", "try_count", "attempt_num"])),
            // float
            (Float, "value".into(), owned(&["num", "number", "x", "amount"])),
            (Float, "rate".into(), owned(&["ratio", "factor", "multiplier", "percent"])),
            (Float, "min_value".into(), owned(&["minimum", "lower", "floor"])),
            (Float, "max_value".into(), owned(&["maximum", "upper", "ceiling"])),
            (Float, "threshold".into(), owned(&["limit", "cutoff"])),
            // boolean
            (Boolean, "flag".into(), owned(&["enabled", "active", "on", "value"])),
            (Boolean, "strict".into(), owned(&["exact", "precise"])),
            (Boolean, "case_sensitive".into(), owned(&["case_insensitive", "ignore_case"])),
            (Boolean, "reverse".into(), owned(&["invert", "descending", "desc"])),
            (Boolean, "include_empty".into(), owned(&["allow_empty", "keep_empty"])),
            // list
            (List, "items".into(), owned(&["lst", "list", "values", "array", "elements", "data"])),
            (List, "keys".into(), owned(&["key_list", "names"])),
            (List, "indices".into(), owned(&["indexes", "positions"])),
            // dict
            (Dict, "data".into(), owned(&["obj", "dict", "mapping", "object", "record"])),
            (Dict, "schema".into(), owned(&["structure", "spec", "definition"])),
            (Dict, "defaults".into(), owned(&["default_values", "fallbacks"])),
            // any
            (Any, "value".into(), owned(&["val", "v", "input", "x"])),
            (Any, "default".into(), owned(&["fallback", "default_value"])),
        ];

        CanonicalVocabulary::from_entries(entries)
    }
}
