// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event handler and event source abstractions.
//!
//! The reporter doesn't depend on any particular test runner. A [`TestEventSource`] feeds test
//! lifecycle events to a [`TestEventHandler`]; the CLI reads them from a JSON lines stream.

use super::events::{ReporterEvent, TestEvent};
use crate::errors::{EventStreamError, ReporterError};
use std::io::BufRead;
use tracing::debug;

/// Receives test lifecycle events.
pub trait TestEventHandler {
    /// Called when a test passes.
    fn on_test_pass(&mut self, event: &TestEvent) -> Result<(), ReporterError>;

    /// Called when a test fails.
    fn on_test_fail(&mut self, event: &TestEvent) -> Result<(), ReporterError>;

    /// Called when a test is skipped.
    fn on_test_skip(&mut self, event: &TestEvent) -> Result<(), ReporterError>;

    /// Called once, after every test has finished.
    fn on_run_end(&mut self) -> Result<(), ReporterError>;

    /// Dispatches `event` to the matching callback.
    fn handle(&mut self, event: &ReporterEvent) -> Result<(), ReporterError> {
        match event {
            ReporterEvent::Pass(event) => self.on_test_pass(event),
            ReporterEvent::Fail(event) => self.on_test_fail(event),
            ReporterEvent::Skip(event) => self.on_test_skip(event),
            ReporterEvent::RunEnd => self.on_run_end(),
        }
    }
}

impl<T: TestEventHandler + ?Sized> TestEventHandler for &mut T {
    fn on_test_pass(&mut self, event: &TestEvent) -> Result<(), ReporterError> {
        (**self).on_test_pass(event)
    }

    fn on_test_fail(&mut self, event: &TestEvent) -> Result<(), ReporterError> {
        (**self).on_test_fail(event)
    }

    fn on_test_skip(&mut self, event: &TestEvent) -> Result<(), ReporterError> {
        (**self).on_test_skip(event)
    }

    fn on_run_end(&mut self) -> Result<(), ReporterError> {
        (**self).on_run_end()
    }
}

/// A source of test lifecycle events.
pub trait TestEventSource {
    /// Feeds every event to `handler`, ending with exactly one run end.
    fn drive(&mut self, handler: &mut dyn TestEventHandler) -> Result<(), EventStreamError>;
}

/// Reads events from newline-delimited JSON, one [`ReporterEvent`] per line.
///
/// Blank lines are skipped, and events after the first run end are ignored. A stream that ends
/// without a run-end event is treated as if it had one, so that results are still published when
/// the host runner doesn't emit it.
#[derive(Debug)]
pub struct JsonLinesEventSource<R> {
    reader: R,
}

impl<R: BufRead> JsonLinesEventSource<R> {
    /// Creates a new source reading from `reader`.
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> TestEventSource for JsonLinesEventSource<R> {
    fn drive(&mut self, handler: &mut dyn TestEventHandler) -> Result<(), EventStreamError> {
        let mut line_number = 0;
        let mut line = String::new();
        loop {
            line.clear();
            let read = self
                .reader
                .read_line(&mut line)
                .map_err(EventStreamError::Read)?;
            if read == 0 {
                break;
            }
            line_number += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let event: ReporterEvent =
                serde_json::from_str(trimmed).map_err(|error| EventStreamError::InvalidEvent {
                    line_number,
                    error,
                })?;
            handler
                .handle(&event)
                .map_err(|error| EventStreamError::Handler { line_number, error })?;

            if event == ReporterEvent::RunEnd {
                debug!("run ended on line {line_number}, ignoring the rest of the stream");
                return Ok(());
            }
        }

        debug!("event stream ended without a run-end event after {line_number} lines");
        handler
            .on_run_end()
            .map_err(|error| EventStreamError::Handler { line_number, error })
    }
}

/// Replays a fixed list of events, followed by a run end if the list doesn't contain one.
#[derive(Clone, Debug, Default)]
pub struct VecEventSource {
    events: Vec<ReporterEvent>,
}

impl VecEventSource {
    /// Creates a new source replaying `events`.
    pub fn new(events: impl IntoIterator<Item = ReporterEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }
}

impl TestEventSource for VecEventSource {
    fn drive(&mut self, handler: &mut dyn TestEventHandler) -> Result<(), EventStreamError> {
        for (index, event) in self.events.iter().enumerate() {
            let line_number = index + 1;
            handler
                .handle(event)
                .map_err(|error| EventStreamError::Handler { line_number, error })?;
            if *event == ReporterEvent::RunEnd {
                return Ok(());
            }
        }
        handler
            .on_run_end()
            .map_err(|error| EventStreamError::Handler {
                line_number: self.events.len(),
                error,
            })
    }
}
