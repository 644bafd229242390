// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Aggregating test events and reporting them at the end of a run.
//!
//! The main structure in this module is [`Reporter`], which implements [`TestEventHandler`].

mod aggregator;
mod events;
mod imp;
mod source;

pub use aggregator::{
    AggregatorOptions, EventDisposition, PublishRequest, ResultAggregator, ResultSink,
    RunEndOutcome, SuppressionPolicy,
};
pub use events::{ReporterEvent, ResultRecord, RunDescriptor, TestError, TestEvent};
pub use imp::{Clock, Reporter};
pub use source::{JsonLinesEventSource, TestEventHandler, TestEventSource, VecEventSource};
