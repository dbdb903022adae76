//! The dual-index block catalog.
//!
//! [`Catalog`] keeps two synchronized collections: an identity-keyed record
//! map (insertion-ordered, so first-seen order is observable downstream) and a
//! name-keyed secondary index. All mutations go through `Catalog` methods so
//! the two can never drift apart.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::block::BlockRecord;
use crate::error::CoreError;
use crate::id::BlockId;

/// In-memory catalog of block records with identity and name lookup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    /// Primary store, keyed by identity hash, insertion-ordered.
    records: IndexMap<BlockId, BlockRecord>,
    /// Secondary index: name -> ids carrying that name, in insertion order.
    by_name: HashMap<String, Vec<BlockId>>,
}

impl Catalog {
    pub fn new() -> Self {
        Catalog::default()
    }

    /// Inserts a record, keeping both indices in sync.
    ///
    /// Returns [`CoreError::DuplicateBlockId`] if the identity already exists;
    /// identity hashes are globally unique, so a collision is a caller bug.
    pub fn insert(&mut self, record: BlockRecord) -> Result<(), CoreError> {
        if self.records.contains_key(&record.id) {
            return Err(CoreError::DuplicateBlockId {
                id: record.id.clone(),
            });
        }
        self.by_name
            .entry(record.name.clone())
            .or_default()
            .push(record.id.clone());
        self.records.insert(record.id.clone(), record);
        Ok(())
    }

    /// Removes a record by id, returning it. Cleans up the name index entry.
    pub fn remove(&mut self, id: &BlockId) -> Result<BlockRecord, CoreError> {
        let record = self
            .records
            .shift_remove(id)
            .ok_or_else(|| CoreError::BlockNotFound { id: id.clone() })?;
        if let Some(ids) = self.by_name.get_mut(&record.name) {
            ids.retain(|existing| existing != id);
            if ids.is_empty() {
                self.by_name.remove(&record.name);
            }
        }
        Ok(record)
    }

    /// Looks up a record by identity hash.
    pub fn get(&self, id: &BlockId) -> Option<&BlockRecord> {
        self.records.get(id)
    }

    /// Returns all ids registered under a name, in insertion order.
    pub fn ids_for_name(&self, name: &str) -> &[BlockId] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns all records registered under a name, in insertion order.
    pub fn records_for_name(&self, name: &str) -> Vec<&BlockRecord> {
        self.ids_for_name(name)
            .iter()
            .filter_map(|id| self.records.get(id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &BlockRecord> {
        self.records.values()
    }

    /// Drains the catalog into a record list, in insertion order.
    pub fn into_records(self) -> Vec<BlockRecord> {
        self.records.into_values().collect()
    }
}

impl FromIterator<BlockRecord> for Catalog {
    /// Builds a catalog from records, silently keeping the first record for
    /// any repeated id. Use [`Catalog::insert`] when collisions must surface.
    fn from_iter<T: IntoIterator<Item = BlockRecord>>(iter: T) -> Self {
        let mut catalog = Catalog::new();
        for record in iter {
            let _ = catalog.insert(record);
        }
        catalog
    }
}
