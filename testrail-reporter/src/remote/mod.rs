// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Synchronization with a remote TestRail instance.
//!
//! [`TestRailClient`] wraps the API endpoints the reporter uses on top of a blocking
//! [`Transport`], and [`Publisher`] turns per-suite result buckets into runs and result batches.

mod client;
mod publisher;
mod transport;

pub use client::{Credentials, ErrorHandler, TestRailClient};
pub use publisher::{Publisher, UNKNOWN_SUITE_NAME, format_execution_time};
pub use transport::{HttpRequest, Method, Transport, UreqTransport};
