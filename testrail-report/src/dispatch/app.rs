// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Top-level application and command routing.

use super::{
    commands::{
        AddCaseOpts, ClearOpts, ReportOpts, exec_add_case, exec_clear, exec_report, exec_suites,
    },
    common::{ConfigOpts, current_dir},
};
use crate::{
    Result,
    output::{OutputContext, OutputOpts, OutputWriter},
};
use clap::Subcommand;

/// Report end-to-end test results to TestRail.
///
/// Test events are read as JSON lines. Case ids (`C123`) are taken from test titles, suite ids
/// (`S4`) and browser markers (`<-chrome->`) from full titles.
#[derive(Debug, clap::Parser)]
#[command(
    version,
    bin_name = "testrail-report",
    styles = crate::output::clap_styles::style(),
    max_term_width = 100,
)]
pub struct TestRailReportApp {
    #[clap(flatten)]
    output: OutputOpts,

    #[clap(flatten)]
    config_opts: ConfigOpts,

    #[clap(subcommand)]
    command: Command,
}

impl TestRailReportApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app.
    ///
    /// Returns the exit code.
    pub fn exec(self, _output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        let working_dir = current_dir()?;
        match self.command {
            Command::Report(opts) => exec_report(opts, &self.config_opts, &working_dir),
            Command::Clear(opts) => exec_clear(opts, &self.config_opts, &working_dir),
            Command::AddCase(opts) => {
                exec_add_case(opts, &self.config_opts, &working_dir, output_writer)
            }
            Command::Suites => exec_suites(&self.config_opts, &working_dir, output_writer),
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Report test events and publish results when the run ends.
    ///
    /// Exits with code 100 if any test failed, after results have been published.
    Report(ReportOpts),

    /// Start a new attempt cycle by clearing failure markers.
    Clear(ClearOpts),

    /// Create cases in the configured suite and print their tags.
    AddCase(AddCaseOpts),

    /// List the suites of the configured project.
    Suites,
}
