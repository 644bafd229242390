// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{
    aggregator::{EventDisposition, ResultAggregator, ResultSink, RunEndOutcome},
    events::{RunDescriptor, TestEvent},
    source::TestEventHandler,
};
use crate::{errors::ReporterError, state::StateStore};
use chrono::{DateTime, FixedOffset, Local};
use tracing::{debug, info};

/// Returns the current time, used as the execution timestamp of a finished run.
pub type Clock = fn() -> DateTime<FixedOffset>;

fn local_now() -> DateTime<FixedOffset> {
    Local::now().fixed_offset()
}

/// Reports test results to TestRail.
///
/// Feeds every event into a [`ResultAggregator`] and, once the run ends, publishes the
/// accumulated results through a [`ResultSink`].
pub struct Reporter<S, P> {
    aggregator: ResultAggregator<S>,
    sink: P,
    clock: Clock,
    run_end: Option<RunEndOutcome>,
}

impl<S: StateStore, P: ResultSink> Reporter<S, P> {
    /// Creates a new reporter that stamps runs with the local time.
    pub fn new(aggregator: ResultAggregator<S>, sink: P) -> Self {
        Self {
            aggregator,
            sink,
            clock: local_now,
            run_end: None,
        }
    }

    /// Replaces the clock used to stamp runs.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the run-wide counts so far.
    pub fn counts(&self) -> RunDescriptor {
        self.aggregator.counts()
    }

    /// Returns true if any failing test was seen.
    pub fn saw_failures(&self) -> bool {
        self.aggregator.counts().failed > 0
    }

    /// Returns the outcome of the run end, if the run has ended.
    pub fn run_end(&self) -> Option<RunEndOutcome> {
        self.run_end
    }

    /// Returns the aggregator.
    pub fn aggregator(&self) -> &ResultAggregator<S> {
        &self.aggregator
    }

    /// Returns the sink results are published to.
    pub fn sink(&self) -> &P {
        &self.sink
    }

    /// Consumes self, returning the sink.
    pub fn into_sink(self) -> P {
        self.sink
    }
}

impl<S: StateStore, P: ResultSink> TestEventHandler for Reporter<S, P> {
    fn on_test_pass(&mut self, event: &TestEvent) -> Result<(), ReporterError> {
        let disposition = self.aggregator.on_test_pass(event)?;
        log_disposition("pass", event, &disposition);
        Ok(())
    }

    fn on_test_fail(&mut self, event: &TestEvent) -> Result<(), ReporterError> {
        let disposition = self.aggregator.on_test_fail(event)?;
        log_disposition("fail", event, &disposition);
        Ok(())
    }

    fn on_test_skip(&mut self, event: &TestEvent) -> Result<(), ReporterError> {
        let disposition = self.aggregator.on_test_skip(event)?;
        log_disposition("skip", event, &disposition);
        Ok(())
    }

    fn on_run_end(&mut self) -> Result<(), ReporterError> {
        let executed_at = (self.clock)();
        let outcome = self.aggregator.on_run_end(executed_at, &mut self.sink)?;
        if let RunEndOutcome::Published { suites } = outcome {
            info!(
                "published results of {suites} suite{} ({})",
                if suites == 1 { "" } else { "s" },
                self.aggregator.counts(),
            );
        }
        self.run_end = Some(outcome);
        Ok(())
    }
}

fn log_disposition(kind: &str, event: &TestEvent, disposition: &EventDisposition) {
    match disposition {
        EventDisposition::Recorded { suite, records } => {
            debug!("{kind} `{}`: {records} result(s) for suite {suite}", event.title)
        }
        EventDisposition::NoCases => debug!("{kind} `{}`: no case ids in title", event.title),
        EventDisposition::NoSuite => debug!("{kind} `{}`: no suite, dropped", event.title),
        EventDisposition::Suppressed { .. } => {}
    }
}
