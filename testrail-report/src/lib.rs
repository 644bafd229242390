// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Report end-to-end test results to TestRail.
//!
//! `testrail-report` reads test events as JSON lines, extracts case and suite ids from test titles,
//! and publishes one batch of results per browser and suite when the run ends. Failures are
//! remembered across retries of the same run, so that a retried pass doesn't mask an earlier
//! failure.
//!
//! The library behind this binary is
//! [testrail-reporter](https://crates.io/crates/testrail-reporter).

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::{OutputContext, OutputWriter, StderrStyles};
