// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subcommand implementations.

use super::common::ConfigOpts;
use crate::{ExpectedError, Result, output::OutputWriter};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use std::{
    fs::File,
    io::{self, BufReader, Write},
};
use testrail_metadata::{AddCase, AddSection, ReporterExitCode, SectionSummary, SuiteId};
use testrail_reporter::{
    config::ReporterConfig,
    remote::{Publisher, TestRailClient, Transport, UNKNOWN_SUITE_NAME, UreqTransport},
    reporter::{JsonLinesEventSource, Reporter, ResultAggregator, TestEventSource},
    state::{FailureMarkers, FsStore, RunIdCache, clear_run_state},
};
use tracing::{debug, info};

#[derive(Debug, Args)]
pub(crate) struct ReportOpts {
    /// File to read JSON lines test events from, or `-` for standard input [default: -]
    #[arg(long, value_name = "PATH")]
    pub(crate) events: Option<Utf8PathBuf>,
}

pub(crate) fn exec_report(
    opts: ReportOpts,
    config_opts: &ConfigOpts,
    working_dir: &Utf8Path,
) -> Result<i32> {
    let config = config_opts.make_config(working_dir)?;
    let state_dir = config
        .state_dir(working_dir)
        .map_err(ExpectedError::config)?;
    debug!("using state directory `{state_dir}`");

    let store = FsStore::open(state_dir).map_err(ExpectedError::state)?;
    let cache =
        RunIdCache::open(store.clone(), &config.timestamp).map_err(ExpectedError::state)?;
    let publisher = Publisher::new(make_client(&config), cache, config.assigned_to_id);
    let aggregator =
        ResultAggregator::new(FailureMarkers::new(store), config.aggregator_options());
    let mut reporter = Reporter::new(aggregator, publisher);

    let events_file = opts.events.as_deref().filter(|path| path.as_str() != "-");
    let driven = match events_file {
        None => JsonLinesEventSource::new(io::stdin().lock()).drive(&mut reporter),
        Some(path) => {
            let file = File::open(path).map_err(|error| ExpectedError::EventsOpenError {
                path: path.to_owned(),
                error,
            })?;
            JsonLinesEventSource::new(BufReader::new(file)).drive(&mut reporter)
        }
    };
    driven.map_err(|err| ExpectedError::EventStreamError { err })?;

    let counts = reporter.counts();
    debug!(
        "processed {} test events ({} passed, {} failed, {} pending)",
        counts.total(),
        counts.passed,
        counts.failed,
        counts.pending,
    );

    if reporter.saw_failures() {
        Ok(ReporterExitCode::TEST_RUN_FAILED)
    } else {
        Ok(ReporterExitCode::OK)
    }
}

#[derive(Debug, Args)]
pub(crate) struct ClearOpts {
    /// Also forget the cycle timestamp and cached run ids, so the next run creates new runs
    #[arg(long)]
    pub(crate) all: bool,
}

pub(crate) fn exec_clear(
    opts: ClearOpts,
    config_opts: &ConfigOpts,
    working_dir: &Utf8Path,
) -> Result<i32> {
    let state_dir = config_opts.state_dir(working_dir)?;
    let mut store = FsStore::open(state_dir.clone()).map_err(ExpectedError::state)?;

    FailureMarkers::new(&mut store)
        .clear_all()
        .map_err(ExpectedError::state)?;
    if opts.all {
        clear_run_state(&mut store).map_err(ExpectedError::state)?;
        info!("cleared failure markers and cached runs in `{state_dir}`");
    } else {
        info!("cleared failure markers in `{state_dir}`");
    }

    Ok(ReporterExitCode::OK)
}

#[derive(Debug, Args)]
pub(crate) struct AddCaseOpts {
    /// Name of the section to add cases to, created if it doesn't exist
    #[arg(long, value_name = "NAME")]
    pub(crate) section: String,

    /// Titles of the cases to create
    #[arg(required = true, value_name = "TITLE")]
    pub(crate) titles: Vec<String>,
}

pub(crate) fn exec_add_case(
    opts: AddCaseOpts,
    config_opts: &ConfigOpts,
    working_dir: &Utf8Path,
    output_writer: &mut OutputWriter,
) -> Result<i32> {
    let config = config_opts.make_config(working_dir)?;
    let suite_id = config
        .fallback_suite
        .as_ref()
        .ok_or(ExpectedError::SuiteIdRequired {
            command: "add-case",
        })?
        .suite_id()
        .map_err(|err| ExpectedError::InvalidSuiteId { err })?;

    let mut client = make_client(&config);
    let mut writer = output_writer.stdout_writer();
    add_cases(&mut client, suite_id, &opts, &mut writer)?;
    writer.flush().map_err(ExpectedError::write_output)?;

    Ok(ReporterExitCode::OK)
}

pub(crate) fn exec_suites(
    config_opts: &ConfigOpts,
    working_dir: &Utf8Path,
    output_writer: &mut OutputWriter,
) -> Result<i32> {
    let config = config_opts.make_config(working_dir)?;
    let mut client = make_client(&config);
    let mut writer = output_writer.stdout_writer();
    list_suites(&mut client, &mut writer)?;
    writer.flush().map_err(ExpectedError::write_output)?;

    Ok(ReporterExitCode::OK)
}

fn make_client(config: &ReporterConfig) -> TestRailClient<UreqTransport> {
    TestRailClient::new(UreqTransport::new(), &config.credentials, config.project_id)
}

/// Creates one case per title in the named section, printing the tag of each new case.
fn add_cases<T: Transport>(
    client: &mut TestRailClient<T>,
    suite_id: SuiteId,
    opts: &AddCaseOpts,
    writer: &mut dyn Write,
) -> Result<()> {
    let section = find_or_add_section(client, suite_id, &opts.section)?;

    for title in &opts.titles {
        let case = client
            .add_case(
                section.id,
                &AddCase {
                    title: title.clone(),
                },
            )
            .map_err(ExpectedError::api("add_case"))?
            .ok_or(ExpectedError::EmptyResponse {
                operation: "add_case",
            })?;
        writeln!(writer, "{} {}", case.id.title_tag(), case.title)
            .map_err(ExpectedError::write_output)?;
    }

    Ok(())
}

fn find_or_add_section<T: Transport>(
    client: &mut TestRailClient<T>,
    suite_id: SuiteId,
    name: &str,
) -> Result<SectionSummary> {
    let sections = client
        .get_sections(suite_id)
        .map_err(ExpectedError::api("get_sections"))?
        .unwrap_or_default();
    if let Some(section) = sections.into_iter().find(|section| section.name == name) {
        debug!("found section `{name}` ({})", section.id);
        return Ok(section);
    }

    let section = client
        .add_section(&AddSection {
            suite_id,
            name: name.to_owned(),
            parent_id: None,
        })
        .map_err(ExpectedError::api("add_section"))?
        .ok_or(ExpectedError::EmptyResponse {
            operation: "add_section",
        })?;
    info!("created section `{name}` in suite {suite_id}");
    Ok(section)
}

fn list_suites<T: Transport>(
    client: &mut TestRailClient<T>,
    writer: &mut dyn Write,
) -> Result<()> {
    let suites = client
        .get_suites()
        .map_err(ExpectedError::api("get_suites"))?
        .unwrap_or_default();
    for suite in suites {
        let name = suite.name.as_deref().unwrap_or(UNKNOWN_SUITE_NAME);
        writeln!(writer, "S{} {name}", suite.id).map_err(ExpectedError::write_output)?;
    }
    Ok(())
}
