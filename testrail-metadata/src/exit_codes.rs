// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `testrail-report` failures.
///
/// `testrail-report` invocations may fail for a variety of reasons. This structure documents the
/// exit codes that may occur in case of expected failures.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum ReporterExitCode {}

impl ReporterExitCode {
    /// No errors occurred and the reporter exited normally.
    pub const OK: i32 = 0;

    /// One or more tests in the reported run failed. Results were still published.
    pub const TEST_RUN_FAILED: i32 = 100;

    /// Reading or parsing the event stream produced an error.
    pub const EVENT_STREAM_FAILED: i32 = 104;

    /// An event that had to be reported could not be interpreted, for example because its full
    /// title carries no browser marker.
    pub const EVENT_REJECTED: i32 = 105;

    /// Publishing results to the remote service failed.
    pub const PUBLISH_FAILED: i32 = 106;

    /// Reading or writing local reporter state failed.
    pub const STATE_ERROR: i32 = 107;

    /// Writing data to stdout or stderr produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;

    /// A user issue happened while setting up a reporter invocation, e.g. a missing required
    /// configuration value.
    pub const SETUP_ERROR: i32 = 96;
}
