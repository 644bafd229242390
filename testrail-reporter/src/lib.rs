// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for [testrail-report](https://crates.io/crates/testrail-report), which
//! reports end-to-end test results to TestRail.
//!
//! The basic flow is:
//!
//! 1. A [`TestEventSource`](reporter::TestEventSource) feeds pass, fail and skip events to a
//!    [`Reporter`](reporter::Reporter).
//! 2. The reporter's [`ResultAggregator`](reporter::ResultAggregator) extracts case ids, the suite
//!    and the browser from test titles, and accumulates one bucket of results per suite. Failed
//!    cases are marked in persisted state so that a later pass in the same attempt cycle can't
//!    hide the failure.
//! 3. At the end of the run, the [`Publisher`](remote::Publisher) creates (or reuses) a run per
//!    browser and suite and submits each bucket in a single batch.

pub mod config;
pub mod errors;
pub mod ids;
pub mod remote;
pub mod reporter;
pub mod state;
