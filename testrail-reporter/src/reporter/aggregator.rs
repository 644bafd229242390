// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Aggregation of test events into per-suite result buckets.

use super::events::{ResultRecord, RunDescriptor, TestEvent};
use crate::{
    errors::{AggregateError, PublishError},
    ids::{SuiteToken, extract_browser_name, extract_case_ids, extract_suite_token},
    state::{FailureMarkers, StateStore},
};
use chrono::{DateTime, FixedOffset};
use indexmap::{IndexMap, map::Entry};
use serde::Deserialize;
use std::{collections::VecDeque, fmt};
use testrail_metadata::{CaseId, ResultStatus, SuiteId};
use tracing::{debug, warn};

/// How a pass is treated when the test references cases that failed earlier in the cycle.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum SuppressionPolicy {
    /// If any referenced case is marked, the whole pass is dropped: no records are produced and the
    /// pass isn't counted.
    #[default]
    AnyCase,

    /// Only the marked cases are dropped. The pass is counted if at least one record survives.
    PerCase,
}

impl fmt::Display for SuppressionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AnyCase => write!(f, "any-case"),
            Self::PerCase => write!(f, "per-case"),
        }
    }
}

/// Options for a [`ResultAggregator`].
#[derive(Clone, Debug)]
pub struct AggregatorOptions {
    /// The suite used for events whose full title has no suite token.
    pub fallback_suite: Option<SuiteToken>,

    /// The name prefix of created runs.
    pub run_name: String,

    /// How passes for marked cases are treated.
    pub suppression: SuppressionPolicy,
}

/// What happened to a single test event.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EventDisposition {
    /// Records were added to the bucket of `suite`.
    Recorded {
        /// The bucket the records went to.
        suite: SuiteToken,
        /// The number of records added.
        records: usize,
    },

    /// The title references no cases. The event was counted but produced no records.
    NoCases,

    /// No suite could be resolved. The event was counted but produced no records.
    NoSuite,

    /// A pass was dropped because the listed cases failed earlier in the cycle.
    Suppressed {
        /// The marked cases that caused the suppression.
        marked: Vec<CaseId>,
    },
}

/// The results of a single suite, handed to a [`ResultSink`] at the end of the run.
#[derive(Clone, Debug)]
pub struct PublishRequest<'a> {
    /// The time the run finished. Shared by every suite of the run.
    pub executed_at: DateTime<FixedOffset>,

    /// The name prefix of created runs.
    pub run_name: &'a str,

    /// Run-wide counts.
    pub descriptor: RunDescriptor,

    /// The suite the results belong to.
    pub suite_id: SuiteId,

    /// The records to submit, in bucket order.
    pub results: &'a [ResultRecord],
}

/// Receives the results of each suite at the end of the run.
pub trait ResultSink {
    /// Publishes the results of a single suite.
    fn publish(&mut self, request: PublishRequest<'_>) -> Result<(), PublishError>;
}

impl<T: ResultSink + ?Sized> ResultSink for &mut T {
    fn publish(&mut self, request: PublishRequest<'_>) -> Result<(), PublishError> {
        (**self).publish(request)
    }
}

/// The outcome of [`ResultAggregator::on_run_end`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RunEndOutcome {
    /// No bucket was populated, so nothing was published.
    NoResults,

    /// Every populated bucket was published.
    Published {
        /// The number of suites that were published.
        suites: usize,
    },
}

/// Accumulates the results of a run, one bucket per suite token.
///
/// Passes are prepended to their bucket while failures and skips are appended, so a submitted
/// batch lists the passes (most recent first) ahead of every failure and retest. When a batch
/// contains several results for one case, the remote service keeps the last one as the case's
/// status, so a failure outranks a pass of the same case.
pub struct ResultAggregator<S> {
    markers: FailureMarkers<S>,
    options: AggregatorOptions,
    counts: RunDescriptor,
    buckets: IndexMap<SuiteToken, SuiteBucket>,
}

/// The records of one suite token, along with the suite id it resolved to.
#[derive(Debug)]
struct SuiteBucket {
    suite_id: SuiteId,
    records: VecDeque<ResultRecord>,
}

impl<S: StateStore> ResultAggregator<S> {
    /// Creates an aggregator for a new run.
    pub fn new(markers: FailureMarkers<S>, options: AggregatorOptions) -> Self {
        Self {
            markers,
            options,
            counts: RunDescriptor::default(),
            buckets: IndexMap::new(),
        }
    }

    /// Returns the run-wide counts so far.
    pub fn counts(&self) -> RunDescriptor {
        self.counts
    }

    /// Returns the failure markers.
    pub fn markers(&self) -> &FailureMarkers<S> {
        &self.markers
    }

    /// Returns the records accumulated for `suite`, in submission order.
    pub fn bucket(&self, suite: &SuiteToken) -> Option<Vec<ResultRecord>> {
        self.buckets
            .get(suite)
            .map(|bucket| bucket.records.iter().cloned().collect())
    }

    /// Records a passed test.
    pub fn on_test_pass(&mut self, event: &TestEvent) -> Result<EventDisposition, AggregateError> {
        let case_ids = extract_case_ids(&event.title);

        let mut marked = Vec::new();
        for &case_id in &case_ids {
            if self.markers.is_marked(case_id)? {
                marked.push(case_id);
            }
        }

        let case_ids = match self.options.suppression {
            SuppressionPolicy::AnyCase if !marked.is_empty() => {
                debug!(
                    "suppressing pass of `{}`: cases {} failed earlier",
                    event.title,
                    display_case_ids(&marked),
                );
                return Ok(EventDisposition::Suppressed { marked });
            }
            SuppressionPolicy::AnyCase => case_ids,
            SuppressionPolicy::PerCase => {
                let remaining: Vec<_> = case_ids
                    .into_iter()
                    .filter(|case_id| !marked.contains(case_id))
                    .collect();
                if remaining.is_empty() && !marked.is_empty() {
                    debug!(
                        "suppressing pass of `{}`: cases {} failed earlier",
                        event.title,
                        display_case_ids(&marked),
                    );
                    return Ok(EventDisposition::Suppressed { marked });
                }
                remaining
            }
        };

        self.counts.passed += 1;
        let comment = event.title.clone();
        self.record(event, &case_ids, ResultStatus::Passed, comment, Placement::Front)
    }

    /// Records a failed test, marking every case it references.
    pub fn on_test_fail(&mut self, event: &TestEvent) -> Result<EventDisposition, AggregateError> {
        let case_ids = extract_case_ids(&event.title);
        for &case_id in &case_ids {
            self.markers.mark(case_id)?;
        }

        self.counts.failed += 1;
        let comment = failure_comment(event);
        self.record(event, &case_ids, ResultStatus::Failed, comment, Placement::Back)
    }

    /// Records a skipped test. Skips are reported as needing a retest.
    pub fn on_test_skip(&mut self, event: &TestEvent) -> Result<EventDisposition, AggregateError> {
        let case_ids = extract_case_ids(&event.title);

        self.counts.pending += 1;
        let comment = event.title.clone();
        self.record(event, &case_ids, ResultStatus::Retest, comment, Placement::Back)
    }

    /// Hands every populated bucket to `sink`, in the order the buckets were first populated.
    ///
    /// Buckets are drained, so a second call reports no results. Suite ids were validated when each
    /// bucket was first populated, so only the sink can fail here. Publishing stops at the first
    /// error.
    pub fn on_run_end(
        &mut self,
        executed_at: DateTime<FixedOffset>,
        sink: &mut dyn ResultSink,
    ) -> Result<RunEndOutcome, PublishError> {
        let buckets = std::mem::take(&mut self.buckets);
        if buckets.is_empty() {
            warn!("no test cases were matched, skipping publishing results");
            return Ok(RunEndOutcome::NoResults);
        }

        let suites = buckets.len();
        for (suite, bucket) in buckets {
            let SuiteBucket { suite_id, records } = bucket;
            let results = Vec::from(records);
            debug!(
                "publishing {} results for suite {suite} ({})",
                results.len(),
                self.counts,
            );
            sink.publish(PublishRequest {
                executed_at,
                run_name: &self.options.run_name,
                descriptor: self.counts,
                suite_id,
                results: &results,
            })?;
        }

        Ok(RunEndOutcome::Published { suites })
    }

    fn resolve_suite(&self, full_title: &str) -> Option<SuiteToken> {
        extract_suite_token(full_title).or_else(|| self.options.fallback_suite.clone())
    }

    fn record(
        &mut self,
        event: &TestEvent,
        case_ids: &[CaseId],
        status: ResultStatus,
        comment: String,
        placement: Placement,
    ) -> Result<EventDisposition, AggregateError> {
        let Some(suite) = self.resolve_suite(&event.full_title) else {
            return Ok(EventDisposition::NoSuite);
        };
        if case_ids.is_empty() {
            return Ok(EventDisposition::NoCases);
        }

        let browser = extract_browser_name(&event.full_title)?;
        let bucket = match self.buckets.entry(suite.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(SuiteBucket {
                suite_id: suite.suite_id()?,
                records: VecDeque::new(),
            }),
        };

        let records = case_ids.iter().map(|&case_id| ResultRecord {
            case_id,
            status,
            comment: comment.clone(),
            browser: browser.to_owned(),
        });

        match placement {
            Placement::Front => {
                // Keep the event's own case order at the front of the bucket.
                for record in records.rev() {
                    bucket.records.push_front(record);
                }
            }
            Placement::Back => bucket.records.extend(records),
        }

        Ok(EventDisposition::Recorded {
            suite,
            records: case_ids.len(),
        })
    }
}

#[derive(Clone, Copy, Debug)]
enum Placement {
    Front,
    Back,
}

fn failure_comment(event: &TestEvent) -> String {
    let (message, stack) = match &event.error {
        Some(error) => (error.message.as_str(), error.stack.as_str()),
        None => ("", ""),
    };
    format!("{}\n{message}\n{stack}", event.title)
}

fn display_case_ids(case_ids: &[CaseId]) -> String {
    case_ids
        .iter()
        .map(|case_id| case_id.title_tag())
        .collect::<Vec<_>>()
        .join(", ")
}
