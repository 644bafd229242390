// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::{NO_HEADING_TARGET, StderrStyles};
use camino::Utf8PathBuf;
use owo_colors::OwoColorize;
use std::{error::Error, path::PathBuf};
use testrail_metadata::ReporterExitCode;
use testrail_reporter::errors::{
    AggregateError, ApiError, ConfigError, EventStreamError, ParseError, PublishError,
    ReporterError, StoreError,
};
use thiserror::Error;
use tracing::error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

// The #[error()] strings are placeholders: errors are meant to be printed with display_to_stderr,
// which colorizes them and prints the chain of causes.

/// An expected failure of a `testrail-report` invocation.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("could not determine the current directory")]
    CurrentDirFailed {
        #[source]
        error: std::io::Error,
    },
    #[error("current directory is not valid UTF-8")]
    CurrentDirInvalidUtf8 { path: PathBuf },
    #[error("failed to load reporter configuration")]
    ConfigError {
        #[source]
        err: ConfigError,
    },
    #[error("failed to access reporter state")]
    StateError {
        #[source]
        err: StoreError,
    },
    #[error("failed to open event stream")]
    EventsOpenError {
        path: Utf8PathBuf,
        #[source]
        error: std::io::Error,
    },
    #[error("failed to report test events")]
    EventStreamError {
        #[source]
        err: EventStreamError,
    },
    #[error("suite id is required")]
    SuiteIdRequired { command: &'static str },
    #[error("invalid suite id")]
    InvalidSuiteId {
        #[source]
        err: ParseError,
    },
    #[error("remote call failed")]
    ApiError {
        operation: &'static str,
        #[source]
        err: ApiError,
    },
    #[error("remote call returned no data")]
    EmptyResponse { operation: &'static str },
    #[error("error writing output")]
    WriteOutputError {
        #[source]
        error: std::io::Error,
    },
}

impl ExpectedError {
    pub(crate) fn config(err: ConfigError) -> Self {
        Self::ConfigError { err }
    }

    pub(crate) fn state(err: StoreError) -> Self {
        Self::StateError { err }
    }

    pub(crate) fn api(operation: &'static str) -> impl FnOnce(ApiError) -> Self {
        move |err| Self::ApiError { operation, err }
    }

    pub(crate) fn write_output(error: std::io::Error) -> Self {
        Self::WriteOutputError { error }
    }

    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::CurrentDirFailed { .. }
            | Self::CurrentDirInvalidUtf8 { .. }
            | Self::ConfigError { .. }
            | Self::SuiteIdRequired { .. }
            | Self::InvalidSuiteId { .. } => ReporterExitCode::SETUP_ERROR,
            Self::StateError { .. } => ReporterExitCode::STATE_ERROR,
            Self::EventsOpenError { .. } => ReporterExitCode::EVENT_STREAM_FAILED,
            Self::EventStreamError { err } => event_stream_exit_code(err),
            Self::ApiError { .. } | Self::EmptyResponse { .. } => ReporterExitCode::PUBLISH_FAILED,
            Self::WriteOutputError { .. } => ReporterExitCode::WRITE_OUTPUT_ERROR,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match self {
            Self::CurrentDirFailed { error } => {
                error!("could not determine the current directory");
                Some(error as &dyn Error)
            }
            Self::CurrentDirInvalidUtf8 { path } => {
                error!("current directory is not valid UTF-8: {}", path.display());
                None
            }
            Self::ConfigError { err } => {
                error!("{err}");
                err.source()
            }
            Self::StateError { err } => {
                error!("{err}");
                err.source()
            }
            Self::EventsOpenError { path, error } => {
                error!("failed to open event stream `{}`", path.style(styles.bold));
                Some(error as &dyn Error)
            }
            Self::EventStreamError { err } => {
                error!("{err}");
                err.source()
            }
            Self::SuiteIdRequired { command } => {
                error!(
                    "`{}` requires a suite id: set `suite_id` in the configuration, \
                     {} or --suite-id",
                    command.style(styles.bold),
                    "TESTRAIL_SUITE_ID".style(styles.bold),
                );
                None
            }
            Self::InvalidSuiteId { err } => {
                error!("{err}");
                err.source()
            }
            Self::ApiError { operation, err } => {
                error!("`{}` failed: {err}", operation.style(styles.bold));
                err.source()
            }
            Self::EmptyResponse { operation } => {
                error!("`{}` returned no data", operation.style(styles.bold));
                None
            }
            Self::WriteOutputError { error } => {
                error!("error writing output");
                Some(error as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            error!(target: NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}

fn event_stream_exit_code(err: &EventStreamError) -> i32 {
    match err {
        EventStreamError::Handler { error, .. } => match error {
            ReporterError::Aggregate(AggregateError::Store(_))
            | ReporterError::Publish(PublishError::Store(_)) => ReporterExitCode::STATE_ERROR,
            ReporterError::Aggregate(_) => ReporterExitCode::EVENT_REJECTED,
            _ => ReporterExitCode::PUBLISH_FAILED,
        },
        _ => ReporterExitCode::EVENT_STREAM_FAILED,
    }
}
