// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use camino_tempfile::Utf8TempDir;
use color_eyre::eyre::{Result, ensure};
use indoc::indoc;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::{cell::RefCell, rc::Rc};
use testrail_reporter::{
    errors::{ApiError, EventStreamError, PublishError, ReporterError},
    remote::Method,
    reporter::{
        JsonLinesEventSource, ReporterEvent, RunEndOutcome, SuppressionPolicy, TestEvent,
        TestEventSource, VecEventSource,
    },
    state::FsStore,
};

fn pass(title: &str, full_title: &str) -> ReporterEvent {
    ReporterEvent::Pass(TestEvent::new(title, full_title))
}

fn fail(title: &str, full_title: &str, message: &str) -> ReporterEvent {
    ReporterEvent::Fail(TestEvent::new(title, full_title).with_error(message, "at step()"))
}

fn skip(title: &str, full_title: &str) -> ReporterEvent {
    ReporterEvent::Skip(TestEvent::new(title, full_title))
}

#[test]
fn publishes_one_batch_per_suite() -> Result<()> {
    let temp_dir = Utf8TempDir::new()?;
    let store = FsStore::open(temp_dir.path())?;
    let mut transport = RecordingTransport::new();

    let mut reporter = ReporterSetup::default().build(&store, &mut transport);
    VecEventSource::new([
        pass("Login TC1", "Checkout S10 Login TC1 <-chrome->"),
        fail("Payment TC2", "Checkout S10 Payment TC2 <-chrome->", "boom"),
        skip("Logout TC3", "Checkout S10 Logout TC3 <-chrome->"),
        ReporterEvent::RunEnd,
    ])
    .drive(&mut reporter)?;
    assert_eq!(
        reporter.run_end(),
        Some(RunEndOutcome::Published { suites: 1 })
    );
    ensure!(reporter.saw_failures(), "the failure was counted");
    drop(reporter);

    assert_eq!(
        transport.endpoints(),
        vec!["get_suites/3", "add_run/3", "add_results_for_cases/100"]
    );

    let name = format!("Nightly on chrome, Checkout: automated test run {EXECUTED_AT}");
    assert_eq!(
        transport.bodies_of("add_run/")[0],
        &json!({
            "suite_id": 10,
            "name": name,
            "description": format!(
                "{name}\nExecution summary:\nPasses: 1\nFails: 1\nPending: 1\nTotal: 3\n"
            ),
            "include_all": true,
        })
    );
    assert_eq!(
        transport.bodies_of("add_results_for_cases/")[0],
        &json!({
            "results": [
                {"case_id": 1, "status_id": 1, "comment": "Login TC1"},
                {"case_id": 2, "status_id": 5, "comment": "Payment TC2\nboom\nat step()"},
                {"case_id": 3, "status_id": 4, "comment": "Logout TC3"},
            ]
        })
    );
    assert!(
        transport
            .requests
            .iter()
            .all(|request| (request.method == Method::Get) == request.body.is_none())
    );

    Ok(())
}

#[test]
fn separate_suites_and_browsers_get_separate_runs() -> Result<()> {
    let temp_dir = Utf8TempDir::new()?;
    let store = FsStore::open(temp_dir.path())?;
    let mut transport = RecordingTransport::new();

    let mut reporter = ReporterSetup::default().build(&store, &mut transport);
    VecEventSource::new([
        pass("C1", "S10 C1 <-chrome->"),
        pass("C2", "S20 C2 <-chrome->"),
        fail("C3", "S10 C3 <-firefox->", "boom"),
        pass("C4 C5", "S30 C4 C5 <-chrome->"),
    ])
    .drive(&mut reporter)?;
    drop(reporter);

    assert_eq!(
        transport.endpoints(),
        vec![
            // Suite 10: chrome first, then firefox.
            "get_suites/3",
            "add_run/3",
            "add_results_for_cases/100",
            "add_run/3",
            "add_results_for_cases/101",
            // Suite 20.
            "get_suites/3",
            "add_run/3",
            "add_results_for_cases/102",
            // Suite 30 has no name.
            "get_suites/3",
            "add_run/3",
            "add_results_for_cases/103",
        ]
    );

    let runs = transport.bodies_of("add_run/");
    let names: Vec<_> = runs
        .iter()
        .map(|body| body["name"].as_str().unwrap_or_default())
        .collect();
    assert_eq!(
        names,
        vec![
            format!("Nightly on chrome, Checkout: automated test run {EXECUTED_AT}"),
            format!("Nightly on firefox, Checkout: automated test run {EXECUTED_AT}"),
            format!("Nightly on chrome, Accounts: automated test run {EXECUTED_AT}"),
            format!("Nightly on chrome, unknown suite: automated test run {EXECUTED_AT}"),
        ]
    );

    let batches = transport.bodies_of("add_results_for_cases/");
    assert_eq!(
        batches[0],
        &json!({"results": [{"case_id": 1, "status_id": 1, "comment": "C1"}]})
    );
    assert_eq!(
        batches[1],
        &json!({"results": [{"case_id": 3, "status_id": 5, "comment": "C3\nboom\nat step()"}]})
    );
    assert_eq!(
        batches[3],
        &json!({"results": [
            {"case_id": 4, "status_id": 1, "comment": "C4 C5"},
            {"case_id": 5, "status_id": 1, "comment": "C4 C5"},
        ]})
    );

    Ok(())
}

#[test]
fn no_results_makes_no_calls() -> Result<()> {
    let temp_dir = Utf8TempDir::new()?;
    let store = FsStore::open(temp_dir.path())?;
    let mut transport = RecordingTransport::new();

    let mut reporter = ReporterSetup::default().build(&store, &mut transport);
    VecEventSource::new([
        pass("no case ids here", "S10 no case ids here <-chrome->"),
        skip("C1 without suite", "C1 without suite <-chrome->"),
    ])
    .drive(&mut reporter)?;
    assert_eq!(reporter.run_end(), Some(RunEndOutcome::NoResults));
    assert_eq!(reporter.counts().total(), 2);
    drop(reporter);

    assert_eq!(transport.requests, Vec::new());
    Ok(())
}

#[test]
fn remote_error_is_raised_without_handler() -> Result<()> {
    let temp_dir = Utf8TempDir::new()?;
    let store = FsStore::open(temp_dir.path())?;
    let mut transport = RecordingTransport::new();
    transport.script(
        "add_run/",
        r#"{"error": "Field :suite_id is not a valid test suite."}"#,
    );

    let mut reporter = ReporterSetup::default().build(&store, &mut transport);
    let err = VecEventSource::new([pass("C1", "S10 C1 <-chrome->")])
        .drive(&mut reporter)
        .unwrap_err();
    drop(reporter);

    match err {
        EventStreamError::Handler {
            error: ReporterError::Publish(PublishError::Api(ApiError::Remote { message, .. })),
            ..
        } => assert_eq!(message, "Field :suite_id is not a valid test suite."),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(transport.endpoints(), vec!["get_suites/3", "add_run/3"]);
    Ok(())
}

#[test]
fn remote_error_goes_to_handler() -> Result<()> {
    let temp_dir = Utf8TempDir::new()?;
    let store = FsStore::open(temp_dir.path())?;
    let mut transport = RecordingTransport::new();
    transport.script("add_run/", r#"{"error": "No permission to add runs."}"#);

    let seen = Rc::new(RefCell::new(Vec::new()));
    let seen_in_handler = Rc::clone(&seen);
    let setup = ReporterSetup {
        error_handler: Some(Box::new(move |err: &ApiError| {
            seen_in_handler.borrow_mut().push(err.to_string());
        })),
        ..Default::default()
    };

    let mut reporter = setup.build(&store, &mut transport);
    let err = VecEventSource::new([pass("C1", "S10 C1 <-chrome->")])
        .drive(&mut reporter)
        .unwrap_err();
    drop(reporter);

    // The handler swallowed the error, so no run id could be resolved.
    assert!(
        matches!(
            err,
            EventStreamError::Handler {
                error: ReporterError::Publish(PublishError::RunIdUnresolved { .. }),
                ..
            }
        ),
        "unexpected error: {err:?}"
    );
    assert_eq!(*seen.borrow(), vec!["No permission to add runs.".to_owned()]);
    Ok(())
}

#[test]
fn unknown_suite_is_an_error() -> Result<()> {
    let temp_dir = Utf8TempDir::new()?;
    let store = FsStore::open(temp_dir.path())?;
    let mut transport = RecordingTransport::new();

    let mut reporter = ReporterSetup::default().build(&store, &mut transport);
    let err = VecEventSource::new([pass("C1", "S99 C1 <-chrome->")])
        .drive(&mut reporter)
        .unwrap_err();
    drop(reporter);

    assert!(
        matches!(
            err,
            EventStreamError::Handler {
                error: ReporterError::Publish(PublishError::SuiteNotFound { suite_id }),
                ..
            } if suite_id.get() == 99
        ),
        "unexpected error: {err:?}"
    );
    assert_eq!(transport.endpoints(), vec!["get_suites/3"]);
    Ok(())
}

#[test]
fn json_lines_stream_without_run_end_still_publishes() -> Result<()> {
    let temp_dir = Utf8TempDir::new()?;
    let store = FsStore::open(temp_dir.path())?;
    let mut transport = RecordingTransport::new();

    let input = indoc! {r#"
        {"event": "pass", "title": "Login TC1", "full_title": "S10 Login TC1 <-chrome->"}
        {"event": "skip", "title": "Logout TC3", "full_title": "S10 Logout TC3 <-chrome->"}
    "#};
    let mut reporter = ReporterSetup {
        suppression: SuppressionPolicy::PerCase,
        ..Default::default()
    }
    .build(&store, &mut transport);
    JsonLinesEventSource::new(input.as_bytes()).drive(&mut reporter)?;
    drop(reporter);

    assert_eq!(
        transport.bodies_of("add_results_for_cases/"),
        vec![&json!({"results": [
            {"case_id": 1, "status_id": 1, "comment": "Login TC1"},
            {"case_id": 3, "status_id": 4, "comment": "Logout TC3"},
        ]})]
    );
    Ok(())
}
