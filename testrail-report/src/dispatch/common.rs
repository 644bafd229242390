// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Options shared between subcommands.

use crate::{ExpectedError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use testrail_reporter::config::{ConfigSources, DefaultConfigWarnings, ReporterConfig};

/// Configuration options for testrail-report.
///
/// Values given here take precedence over the config file and `TESTRAIL_` environment variables.
#[derive(Debug, Default, Args)]
#[command(next_help_heading = "Config options")]
pub(crate) struct ConfigOpts {
    /// Config file [default: .config/testrail.toml in the current directory].
    #[arg(long, global = true, value_name = "PATH")]
    pub(crate) config_file: Option<Utf8PathBuf>,

    /// Directory to keep failure markers and cached run ids in.
    #[arg(long, global = true, value_name = "DIR")]
    pub(crate) state_dir: Option<Utf8PathBuf>,

    /// Timestamp identifying the current attempt cycle.
    #[arg(long, global = true)]
    pub(crate) timestamp: Option<String>,

    /// Suite for tests whose full title has no suite id.
    #[arg(long, global = true, value_name = "SUITE")]
    pub(crate) suite_id: Option<String>,

    /// Name prefix of created runs.
    #[arg(long, global = true, value_name = "NAME")]
    pub(crate) run_name: Option<String>,
}

impl ConfigOpts {
    fn sources(&self, working_dir: &Utf8Path) -> ConfigSources {
        let sources = match &self.config_file {
            Some(path) => ConfigSources::new().file(working_dir.join(path)),
            None => ConfigSources::new().default_file(working_dir),
        };
        let mut sources = sources.process_env();

        let overrides = [
            ("state_dir", self.state_dir.as_ref().map(|dir| dir.to_string())),
            ("timestamp", self.timestamp.clone()),
            ("suite_id", self.suite_id.clone()),
            ("run_name", self.run_name.clone()),
        ];
        for (key, value) in overrides {
            if let Some(value) = value {
                sources = sources.set_override(key, value);
            }
        }
        sources
    }

    /// Loads and validates the full configuration.
    pub(crate) fn make_config(&self, working_dir: &Utf8Path) -> Result<ReporterConfig> {
        self.sources(working_dir)
            .load(&mut DefaultConfigWarnings)
            .map_err(ExpectedError::config)
    }

    /// Loads only the state directory, which doesn't need credentials.
    pub(crate) fn state_dir(&self, working_dir: &Utf8Path) -> Result<Utf8PathBuf> {
        self.sources(working_dir)
            .load_state_dir(working_dir, &mut DefaultConfigWarnings)
            .map_err(ExpectedError::config)
    }
}

/// Returns the current directory, which config and state paths are relative to.
pub(crate) fn current_dir() -> Result<Utf8PathBuf> {
    let path = std::env::current_dir()
        .map_err(|error| ExpectedError::CurrentDirFailed { error })?;
    Utf8PathBuf::try_from(path).map_err(|err| ExpectedError::CurrentDirInvalidUtf8 {
        path: err.into_path_buf(),
    })
}
