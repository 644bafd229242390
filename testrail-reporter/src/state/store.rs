// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::StoreError;
use std::fmt;

/// A hierarchical namespace within a [`StateStore`].
///
/// Clearing a namespace also clears every namespace nested inside it.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Namespace {
    components: Vec<String>,
}

impl Namespace {
    /// Creates a top-level namespace.
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            components: vec![component.into()],
        }
    }

    /// Returns a namespace nested inside this one.
    pub fn child(&self, component: impl Into<String>) -> Self {
        let mut components = self.components.clone();
        components.push(component.into());
        Self { components }
    }

    /// Returns the components of this namespace, outermost first.
    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Returns true if `self` is `other` or nested inside it.
    pub fn is_within(&self, other: &Namespace) -> bool {
        self.components.starts_with(&other.components)
    }

    /// Returns a key named `name` within this namespace.
    pub fn key(&self, name: impl Into<String>) -> StateKey {
        StateKey {
            namespace: self.clone(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.components.join("/"))
    }
}

/// The key of a single state entry.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct StateKey {
    namespace: Namespace,
    name: String,
}

impl StateKey {
    /// Returns the namespace this key belongs to.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Returns the name of this key within its namespace.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Small key-value persistence interface used for reporter state.
///
/// All operations are synchronous; when they return, the change is durable.
pub trait StateStore {
    /// Returns the value stored at `key`, if any.
    fn get(&self, key: &StateKey) -> Result<Option<String>, StoreError>;

    /// Stores `value` at `key`, replacing any existing value.
    fn set(&mut self, key: &StateKey, value: &str) -> Result<(), StoreError>;

    /// Removes the value stored at `key`. Removing a missing key is not an error.
    fn delete(&mut self, key: &StateKey) -> Result<(), StoreError>;

    /// Removes every entry within `namespace`, including nested namespaces. Clearing a missing
    /// namespace is not an error.
    fn clear(&mut self, namespace: &Namespace) -> Result<(), StoreError>;

    /// Returns the names of the keys stored directly within `namespace`, sorted.
    fn names(&self, namespace: &Namespace) -> Result<Vec<String>, StoreError>;
}

impl<S: StateStore + ?Sized> StateStore for &mut S {
    fn get(&self, key: &StateKey) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &StateKey, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn delete(&mut self, key: &StateKey) -> Result<(), StoreError> {
        (**self).delete(key)
    }

    fn clear(&mut self, namespace: &Namespace) -> Result<(), StoreError> {
        (**self).clear(namespace)
    }

    fn names(&self, namespace: &Namespace) -> Result<Vec<String>, StoreError> {
        (**self).names(namespace)
    }
}
