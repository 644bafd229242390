// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persisted reporter state.
//!
//! Retried test runs are separate processes, so the little state the reporter needs to carry
//! between them (failure markers, the pinned attempt-cycle timestamp and cached run ids) is
//! persisted through the [`StateStore`] trait. [`FsStore`] keeps it in a directory tree, while
//! [`MemoryStore`] is used for tests.

mod fs;
mod markers;
mod memory;
mod run_cache;
mod state_dir;
mod store;

pub use fs::FsStore;
pub use markers::FailureMarkers;
pub use memory::MemoryStore;
pub use run_cache::{RunIdCache, clear_run_state};
pub use state_dir::{
    MAX_ENCODED_LEN, TESTRAIL_STATE_DIR_ENV, decode_component, encode_bounded_component,
    encode_component, reporter_state_dir,
};
pub use store::{Namespace, StateKey, StateStore};
