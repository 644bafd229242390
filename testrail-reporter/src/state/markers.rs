// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{Namespace, StateStore};
use crate::errors::{DisplayErrorChain, StoreError};
use std::collections::BTreeSet;
use testrail_metadata::CaseId;
use tracing::warn;

const FAILED_CASES_NAMESPACE: &str = "failed-cases";

/// The set of cases that failed earlier in the current attempt cycle.
///
/// A marked case suppresses passes for that case until the markers are cleared, so that an
/// unrelated later pass can't report a case as green while its retest is still pending.
#[derive(Clone, Debug)]
pub struct FailureMarkers<S> {
    store: S,
    namespace: Namespace,
}

impl<S: StateStore> FailureMarkers<S> {
    /// Creates a marker set persisted in `store`.
    pub fn new(store: S) -> Self {
        Self {
            store,
            namespace: Namespace::new(FAILED_CASES_NAMESPACE),
        }
    }

    /// Returns true if `case_id` failed earlier in the current cycle.
    pub fn is_marked(&self, case_id: CaseId) -> Result<bool, StoreError> {
        Ok(self
            .store
            .get(&self.namespace.key(case_id.to_string()))?
            .is_some())
    }

    /// Marks `case_id` as failed. Marking an already-marked case is a no-op.
    pub fn mark(&mut self, case_id: CaseId) -> Result<(), StoreError> {
        self.store
            .set(&self.namespace.key(case_id.to_string()), "")
    }

    /// Removes every marker, starting a new attempt cycle.
    pub fn clear_all(&mut self) -> Result<(), StoreError> {
        self.store.clear(&self.namespace)
    }

    /// Returns every marked case.
    pub fn marked(&self) -> Result<BTreeSet<CaseId>, StoreError> {
        let mut marked = BTreeSet::new();
        for name in self.store.names(&self.namespace)? {
            match name.parse::<CaseId>() {
                Ok(case_id) => {
                    marked.insert(case_id);
                }
                Err(err) => warn!(
                    "ignoring unrecognized failure marker `{name}`: {}",
                    DisplayErrorChain::new(&err),
                ),
            }
        }
        Ok(marked)
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consumes self, returning the underlying store.
    pub fn into_store(self) -> S {
        self.store
    }
}
