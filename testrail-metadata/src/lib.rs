// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Structured access to the TestRail API subset used by `testrail-reporter`.
//!
//! This crate contains the identifiers, result statuses and request/response bodies exchanged
//! with a TestRail instance, along with the documented exit codes of `testrail-report`. It has no
//! knowledge of HTTP; see `testrail-reporter` for the client.

mod api;
mod errors;
mod exit_codes;

pub use api::*;
pub use errors::*;
pub use exit_codes::*;
