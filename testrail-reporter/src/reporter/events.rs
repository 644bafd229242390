// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Events consumed by the reporter and the records it produces from them.

use serde::{Deserialize, Serialize};
use std::fmt;
use testrail_metadata::{CaseId, CaseResult, ResultStatus};

/// A finished test, as reported by the host test runner.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TestEvent {
    /// The title of the test itself. Case ids are read from here.
    pub title: String,

    /// The title of the test including the titles of its enclosing suites. The suite token and
    /// browser marker are read from here.
    pub full_title: String,

    /// The error the test failed with, if it failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<TestError>,
}

impl TestEvent {
    /// Creates a new event without an error.
    pub fn new(title: impl Into<String>, full_title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            full_title: full_title.into(),
            error: None,
        }
    }

    /// Attaches an error to this event.
    pub fn with_error(mut self, message: impl Into<String>, stack: impl Into<String>) -> Self {
        self.error = Some(TestError {
            message: message.into(),
            stack: stack.into(),
        });
        self
    }
}

/// The error a test failed with.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct TestError {
    /// The error message.
    #[serde(default)]
    pub message: String,

    /// The stack trace.
    #[serde(default)]
    pub stack: String,
}

/// A test lifecycle event, in the shape it takes in a JSON event stream.
///
/// ```json
/// {"event": "fail", "title": "Payment TC2", "full_title": "S10 Payment TC2 <-chrome->", "error": {"message": "boom", "stack": "..."}}
/// {"event": "run-end"}
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ReporterEvent {
    /// A test passed.
    Pass(TestEvent),
    /// A test failed.
    Fail(TestEvent),
    /// A test was skipped.
    Skip(TestEvent),
    /// The run finished.
    RunEnd,
}

/// A single result to be submitted for a case.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResultRecord {
    /// The case the result applies to.
    pub case_id: CaseId,
    /// The status reported for the case.
    pub status: ResultStatus,
    /// The comment attached to the result.
    pub comment: String,
    /// The browser the test ran in. Used to pick the remote run.
    pub browser: String,
}

impl ResultRecord {
    /// Converts this record into its wire form.
    pub fn to_case_result(&self) -> CaseResult {
        CaseResult {
            case_id: self.case_id,
            status_id: self.status,
            comment: self.comment.clone(),
        }
    }
}

/// Run-wide counts of finished tests.
///
/// Counts are per event, not per case: a test that references three cases counts once.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct RunDescriptor {
    /// Tests that passed and were not suppressed.
    pub passed: usize,
    /// Tests that failed.
    pub failed: usize,
    /// Tests that were skipped.
    pub pending: usize,
}

impl RunDescriptor {
    /// Returns the total number of counted tests.
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.pending
    }

    /// Returns the description of a run named `name`.
    pub fn describe(&self, name: &str) -> String {
        format!(
            "{name}\nExecution summary:\nPasses: {}\nFails: {}\nPending: {}\nTotal: {}\n",
            self.passed,
            self.failed,
            self.pending,
            self.total(),
        )
    }
}

impl fmt::Display for RunDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} passed, {} failed, {} pending ({} total)",
            self.passed,
            self.failed,
            self.pending,
            self.total()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn event_stream_shape() {
        let event: ReporterEvent = serde_json::from_str(
            r#"{"event": "fail", "title": "Payment TC2", "full_title": "S10 Payment TC2 <-chrome->", "error": {"message": "boom"}}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            ReporterEvent::Fail(
                TestEvent::new("Payment TC2", "S10 Payment TC2 <-chrome->").with_error("boom", "")
            )
        );

        let event: ReporterEvent = serde_json::from_str(r#"{"event": "run-end"}"#).unwrap();
        assert_eq!(event, ReporterEvent::RunEnd);
    }

    #[test]
    fn descriptor_description() {
        let descriptor = RunDescriptor {
            passed: 3,
            failed: 1,
            pending: 2,
        };
        assert_eq!(
            descriptor.describe("Nightly on chrome, Checkout: automated test run now"),
            indoc! {"
                Nightly on chrome, Checkout: automated test run now
                Execution summary:
                Passes: 3
                Fails: 1
                Pending: 2
                Total: 6
            "}
        );
    }
}
