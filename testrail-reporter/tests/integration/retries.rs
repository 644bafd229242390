// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Behavior across retries of a test run. Each retry is a separate reporter over the same state
//! directory, as it would be for separate invocations of the CLI.

use crate::fixtures::*;
use camino_tempfile::Utf8TempDir;
use color_eyre::eyre::Result;
use pretty_assertions::assert_eq;
use serde_json::json;
use testrail_metadata::{CaseId, RunId, SuiteId};
use testrail_reporter::{
    reporter::{
        ReporterEvent, RunEndOutcome, SuppressionPolicy, TestEvent, TestEventSource,
        VecEventSource,
    },
    state::{FailureMarkers, FsStore, RunIdCache, clear_run_state},
};

fn attempt(
    store: &FsStore,
    transport: &mut RecordingTransport,
    setup: ReporterSetup,
    events: Vec<ReporterEvent>,
) -> Result<Option<RunEndOutcome>> {
    let mut reporter = setup.build(store, transport);
    VecEventSource::new(events).drive(&mut reporter)?;
    Ok(reporter.run_end())
}

fn pass(title: &str) -> ReporterEvent {
    ReporterEvent::Pass(TestEvent::new(title, format!("Checkout S10 {title} <-chrome->")))
}

fn fail(title: &str) -> ReporterEvent {
    ReporterEvent::Fail(
        TestEvent::new(title, format!("Checkout S10 {title} <-chrome->")).with_error("boom", ""),
    )
}

#[test]
fn retry_pass_of_failed_case_is_suppressed() -> Result<()> {
    let temp_dir = Utf8TempDir::new()?;
    let store = FsStore::open(temp_dir.path())?;
    let mut transport = RecordingTransport::new();

    let outcome = attempt(
        &store,
        &mut transport,
        ReporterSetup::default(),
        vec![fail("Payment TC2")],
    )?;
    assert_eq!(outcome, Some(RunEndOutcome::Published { suites: 1 }));
    let requests_after_first = transport.requests.len();

    // The retry passes, but the case failed earlier in the cycle.
    let outcome = attempt(
        &store,
        &mut transport,
        ReporterSetup::default(),
        vec![pass("Payment TC2")],
    )?;
    assert_eq!(outcome, Some(RunEndOutcome::NoResults));
    assert_eq!(transport.requests.len(), requests_after_first);

    Ok(())
}

#[test]
fn retries_reuse_the_cycle_run() -> Result<()> {
    let temp_dir = Utf8TempDir::new()?;
    let store = FsStore::open(temp_dir.path())?;
    let mut transport = RecordingTransport::new();

    attempt(
        &store,
        &mut transport,
        ReporterSetup::default(),
        vec![fail("Payment TC2")],
    )?;

    // Retries may be configured with a later timestamp; the cycle stays pinned to the first one.
    let retry = ReporterSetup {
        timestamp: "1714568400",
        ..Default::default()
    };
    attempt(
        &store,
        &mut transport,
        retry,
        vec![fail("Payment TC2"), pass("Login TC1")],
    )?;

    assert_eq!(
        transport.endpoints(),
        vec![
            "get_suites/3",
            "add_run/3",
            "add_results_for_cases/100",
            "get_suites/3",
            "add_results_for_cases/100",
        ]
    );
    assert_eq!(
        transport.bodies_of("add_results_for_cases/")[1],
        &json!({"results": [
            {"case_id": 1, "status_id": 1, "comment": "Login TC1"},
            {"case_id": 2, "status_id": 5, "comment": "Payment TC2\nboom\n"},
        ]})
    );

    let cache = RunIdCache::open(store.clone(), "ignored")?;
    assert_eq!(cache.cycle_timestamp(), "1714564800");
    assert_eq!(
        cache.get("chrome", SuiteId::new(10))?,
        Some(RunId::new(FIRST_RUN_ID))
    );

    Ok(())
}

#[test]
fn clearing_state_starts_a_new_cycle() -> Result<()> {
    let temp_dir = Utf8TempDir::new()?;
    let mut store = FsStore::open(temp_dir.path())?;
    let mut transport = RecordingTransport::new();

    attempt(
        &store,
        &mut transport,
        ReporterSetup::default(),
        vec![fail("Payment TC2")],
    )?;

    FailureMarkers::new(&mut store).clear_all()?;
    clear_run_state(&mut store)?;

    let next_cycle = ReporterSetup {
        timestamp: "1714651200",
        ..Default::default()
    };
    let outcome = attempt(&store, &mut transport, next_cycle, vec![pass("Payment TC2")])?;
    assert_eq!(outcome, Some(RunEndOutcome::Published { suites: 1 }));

    assert_eq!(
        transport.endpoints()[3..],
        ["get_suites/3", "add_run/3", "add_results_for_cases/101"]
    );
    let cache = RunIdCache::open(store.clone(), "ignored")?;
    assert_eq!(cache.cycle_timestamp(), "1714651200");

    Ok(())
}

#[test]
fn per_case_policy_reports_unmarked_cases() -> Result<()> {
    let temp_dir = Utf8TempDir::new()?;
    let store = FsStore::open(temp_dir.path())?;
    let mut transport = RecordingTransport::new();
    let per_case = || ReporterSetup {
        suppression: SuppressionPolicy::PerCase,
        ..Default::default()
    };

    attempt(&store, &mut transport, per_case(), vec![fail("Profile C5")])?;
    attempt(&store, &mut transport, per_case(), vec![pass("Profile C5 C6")])?;

    assert_eq!(
        transport.bodies_of("add_results_for_cases/")[1],
        &json!({"results": [{"case_id": 6, "status_id": 1, "comment": "Profile C5 C6"}]})
    );
    assert!(FailureMarkers::new(store.clone()).is_marked(CaseId::new(5))?);

    Ok(())
}
