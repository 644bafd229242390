// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{Namespace, StateStore};
use crate::errors::StoreError;
use testrail_metadata::{RunId, SuiteId};
use tracing::debug;

const CYCLE_NAMESPACE: &str = "cycle";
const CYCLE_TIMESTAMP_KEY: &str = "timestamp";
const RUNS_NAMESPACE: &str = "runs";

/// Cache of remote run ids, keyed by browser label and suite.
///
/// Entries live under the attempt cycle's timestamp. The first invocation of a cycle pins the
/// configured timestamp; later invocations reuse the pinned one even if they were configured with
/// a different timestamp, so that every retry of a cycle publishes into the same runs.
#[derive(Clone, Debug)]
pub struct RunIdCache<S> {
    store: S,
    cycle_timestamp: String,
    runs: Namespace,
}

impl<S: StateStore> RunIdCache<S> {
    /// Opens the cache, pinning the attempt cycle to `configured_timestamp` unless a timestamp was
    /// already pinned by an earlier invocation.
    pub fn open(mut store: S, configured_timestamp: &str) -> Result<Self, StoreError> {
        let key = Namespace::new(CYCLE_NAMESPACE).key(CYCLE_TIMESTAMP_KEY);
        let cycle_timestamp = match store.get(&key)? {
            Some(pinned) => {
                debug!("reusing pinned cycle timestamp `{pinned}`");
                pinned
            }
            None => {
                store.set(&key, configured_timestamp)?;
                configured_timestamp.to_owned()
            }
        };
        let runs = Namespace::new(RUNS_NAMESPACE).child(cycle_timestamp.clone());

        Ok(Self {
            store,
            cycle_timestamp,
            runs,
        })
    }

    /// Returns the timestamp of the current attempt cycle.
    pub fn cycle_timestamp(&self) -> &str {
        &self.cycle_timestamp
    }

    /// Returns the cached run id for `browser` and `suite_id`, if any.
    pub fn get(&self, browser: &str, suite_id: SuiteId) -> Result<Option<RunId>, StoreError> {
        let key = self.runs.key(entry_name(browser, suite_id));
        match self.store.get(&key)? {
            Some(contents) => contents
                .trim()
                .parse::<RunId>()
                .map(Some)
                .map_err(|err| StoreError::InvalidRunId {
                    key: key.to_string(),
                    contents,
                    err,
                }),
            None => Ok(None),
        }
    }

    /// Caches `run_id` for `browser` and `suite_id`.
    pub fn insert(
        &mut self,
        browser: &str,
        suite_id: SuiteId,
        run_id: RunId,
    ) -> Result<(), StoreError> {
        let key = self.runs.key(entry_name(browser, suite_id));
        self.store.set(&key, &run_id.to_string())
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

fn entry_name(browser: &str, suite_id: SuiteId) -> String {
    format!("{browser}-{suite_id}")
}

/// Removes the pinned cycle timestamp and every cached run id.
///
/// The next invocation will pin its configured timestamp and create new remote runs.
pub fn clear_run_state<S: StateStore>(store: &mut S) -> Result<(), StoreError> {
    store.clear(&Namespace::new(CYCLE_NAMESPACE))?;
    store.clear(&Namespace::new(RUNS_NAMESPACE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MemoryStore;
    use pretty_assertions::assert_eq;

    #[test]
    fn timestamp_is_pinned_once() {
        let mut store = MemoryStore::new();

        let cache = RunIdCache::open(&mut store, "1700000000").unwrap();
        assert_eq!(cache.cycle_timestamp(), "1700000000");

        let cache = RunIdCache::open(&mut store, "1800000000").unwrap();
        assert_eq!(cache.cycle_timestamp(), "1700000000");

        clear_run_state(&mut store).unwrap();
        let cache = RunIdCache::open(&mut store, "1800000000").unwrap();
        assert_eq!(cache.cycle_timestamp(), "1800000000");
    }

    #[test]
    fn entries_are_keyed_by_browser_and_suite() {
        let mut cache = RunIdCache::open(MemoryStore::new(), "1").unwrap();
        let suite = SuiteId::new(10);

        assert_eq!(cache.get("chrome", suite).unwrap(), None);
        cache.insert("chrome", suite, RunId::new(99)).unwrap();

        assert_eq!(cache.get("chrome", suite).unwrap(), Some(RunId::new(99)));
        assert_eq!(cache.get("firefox", suite).unwrap(), None);
        assert_eq!(cache.get("chrome", SuiteId::new(11)).unwrap(), None);
    }

    #[test]
    fn corrupt_entry_is_an_error() {
        let mut store = MemoryStore::new();
        let cache = RunIdCache::open(&mut store, "1").unwrap();
        drop(cache);
        let key = Namespace::new(RUNS_NAMESPACE).child("1").key("chrome-10");
        store.set(&key, "undefined").unwrap();

        let cache = RunIdCache::open(&mut store, "1").unwrap();
        let err = cache.get("chrome", SuiteId::new(10)).unwrap_err();
        assert!(
            matches!(err, StoreError::InvalidRunId { ref contents, .. } if contents == "undefined"),
            "unexpected error: {err:?}"
        );
    }
}
