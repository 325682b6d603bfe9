//! Stores indexed by id.

use crate::catalog::listing::{DocumentFailure, Entry, FailureKind};
use crate::schema::entities::Store;
use std::collections::BTreeMap;
use tracing::warn;

/// Validated stores keyed by their `id` field.
#[derive(Clone, Debug, Default)]
pub struct StoreDirectory {
    by_id: BTreeMap<String, Store>,
}

impl StoreDirectory {
    /// Index `entries` by store id.
    ///
    /// The first store to claim an id keeps it; every later claimant is
    /// returned as a failure against its own document.
    pub fn build(entries: Vec<Entry<Store>>) -> (Self, Vec<DocumentFailure>) {
        let mut by_id = BTreeMap::new();
        let mut duplicates = Vec::new();
        for entry in entries {
            let id = entry.value.id.as_str().to_string();
            if by_id.contains_key(&id) {
                let failure = DocumentFailure::new(entry.path, FailureKind::DuplicateStore(id));
                warn!("{failure}");
                duplicates.push(failure);
                continue;
            }
            by_id.insert(id, entry.value);
        }
        (Self { by_id }, duplicates)
    }

    pub fn get(&self, id: &str) -> Option<&Store> {
        self.by_id.get(id)
    }

    /// Store ids in stable order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.by_id.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
