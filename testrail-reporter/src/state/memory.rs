// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{Namespace, StateKey, StateStore};
use crate::errors::StoreError;
use std::collections::BTreeMap;

/// An in-memory [`StateStore`].
///
/// State is lost when the store is dropped, so this is only suitable for tests and dry runs.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<StateKey, String>,
}

impl MemoryStore {
    /// Creates a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of entries in the store.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the store has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &StateKey) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &StateKey, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.clone(), value.to_owned());
        Ok(())
    }

    fn delete(&mut self, key: &StateKey) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }

    fn clear(&mut self, namespace: &Namespace) -> Result<(), StoreError> {
        self.entries
            .retain(|key, _| !key.namespace().is_within(namespace));
        Ok(())
    }

    fn names(&self, namespace: &Namespace) -> Result<Vec<String>, StoreError> {
        Ok(self
            .entries
            .keys()
            .filter(|key| key.namespace() == namespace)
            .map(|key| key.name().to_owned())
            .collect())
    }
}
