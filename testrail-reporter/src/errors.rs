// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by the reporter.

use camino::Utf8PathBuf;
use std::{error::Error, fmt};
use testrail_metadata::{IdParseError, SuiteId};
use thiserror::Error;

/// An error that occurred while loading or validating the reporter configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// Reading or merging the configuration sources failed.
    #[error("failed to read reporter config{}", display_config_file(.config_file.as_ref()))]
    Read {
        /// The config file that was being read, if any.
        config_file: Option<Utf8PathBuf>,

        /// The underlying error.
        #[source]
        err: config::ConfigError,
    },

    /// A required configuration value was not provided.
    #[error("missing `{name}` value, please update the reporter configuration")]
    MissingField {
        /// The name of the missing key.
        name: &'static str,
    },

    /// A configuration value was provided but is invalid.
    #[error("invalid value for `{name}`: `{input}`")]
    InvalidValue {
        /// The name of the key.
        name: &'static str,

        /// The value that was provided.
        input: String,

        /// The underlying error.
        #[source]
        err: IdParseError,
    },

    /// The state directory could not be determined.
    #[error("failed to determine the reporter state directory")]
    StateDir(#[from] StateDirError),
}

fn display_config_file(config_file: Option<&Utf8PathBuf>) -> String {
    match config_file {
        Some(path) => format!(" at `{path}`"),
        None => String::new(),
    }
}

/// An error that occurred while determining the platform state directory.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StateDirError {
    /// The platform base directory strategy could not be determined.
    #[error("could not determine platform base directory strategy")]
    BaseDirStrategy(#[source] etcetera::HomeDirError),

    /// The platform state directory is not valid UTF-8.
    #[error("platform state directory is not valid UTF-8: {path:?}")]
    StateDirNotUtf8 {
        /// The path that was not UTF-8.
        path: std::path::PathBuf,
    },

    /// The working directory could not be canonicalized.
    #[error("could not canonicalize working directory `{working_dir}`")]
    Canonicalize {
        /// The working directory that could not be canonicalized.
        working_dir: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: std::io::Error,
    },
}

/// An error that occurred while extracting identifiers from a test title.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    /// The full title carries no `<-browser->` marker.
    #[error("browser name is not detected in full test name `{full_title}`")]
    BrowserNameNotFound {
        /// The full title that was searched.
        full_title: String,
    },

    /// A suite token did not contain a usable numeric suite id.
    #[error("suite token `{token}` does not contain a valid suite id")]
    InvalidSuiteToken {
        /// The token that failed to parse.
        token: String,

        /// The underlying error.
        #[source]
        err: IdParseError,
    },
}

/// An error that occurred while reading or writing persisted reporter state.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// A state directory could not be created.
    #[error("failed to create state directory `{path}`")]
    CreateDir {
        /// The directory that could not be created.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: std::io::Error,
    },

    /// A state entry could not be read.
    #[error("failed to read state entry at `{path}`")]
    Read {
        /// The path that could not be read.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: std::io::Error,
    },

    /// A state entry could not be written.
    #[error("failed to write state entry at `{path}`")]
    Write {
        /// The path that could not be written.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: atomicwrites::Error<std::io::Error>,
    },

    /// A state entry or namespace could not be removed.
    #[error("failed to remove state at `{path}`")]
    Remove {
        /// The path that could not be removed.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: std::io::Error,
    },

    /// A cached run id could not be parsed.
    #[error("cached run id `{contents}` for `{key}` is invalid")]
    InvalidRunId {
        /// The cache key.
        key: String,

        /// The contents of the entry.
        contents: String,

        /// The underlying error.
        #[source]
        err: IdParseError,
    },
}

/// An error returned by the remote TestRail API or while talking to it.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    /// The request could not be sent or the response could not be received.
    #[error("{method} request to `{url}` failed")]
    Transport {
        /// The HTTP method.
        method: &'static str,

        /// The URL of the request.
        url: String,

        /// The underlying error.
        #[source]
        error: Box<dyn Error + Send + Sync>,
    },

    /// The request body could not be serialized.
    #[error("failed to encode request body of `{endpoint}`")]
    Encode {
        /// The API endpoint, e.g. `add_run/1`.
        endpoint: String,

        /// The underlying error.
        #[source]
        error: serde_json::Error,
    },

    /// The response body was not the JSON document that was expected.
    #[error("failed to decode response of `{endpoint}`")]
    Decode {
        /// The API endpoint, e.g. `add_run/1`.
        endpoint: String,

        /// The underlying error.
        #[source]
        error: serde_json::Error,
    },

    /// The service returned an error body.
    #[error("{message}")]
    Remote {
        /// The API endpoint, e.g. `add_run/1`.
        endpoint: String,

        /// The error message returned by the service.
        message: String,
    },
}

/// An error that occurred while publishing results for a suite.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PublishError {
    /// There were no results to publish.
    #[error("no results to publish for suite {suite_id}")]
    EmptyResults {
        /// The suite that was being published.
        suite_id: SuiteId,
    },

    /// The suite could not be found in the project.
    #[error("suite {suite_id} not found in project")]
    SuiteNotFound {
        /// The suite that was looked up.
        suite_id: SuiteId,
    },

    /// No run id could be found in the cache or obtained from the service.
    #[error("couldn't get run id for browser `{browser}` and suite {suite_id}")]
    RunIdUnresolved {
        /// The browser label.
        browser: String,

        /// The suite.
        suite_id: SuiteId,
    },

    /// The suite token of a result bucket could not be converted to a suite id.
    #[error("invalid suite token")]
    Parse(#[from] ParseError),

    /// A remote call failed.
    #[error("remote call failed")]
    Api(#[from] ApiError),

    /// Reading or writing the run-id cache failed.
    #[error("run-id cache access failed")]
    Store(#[from] StoreError),
}

/// An error that occurred while aggregating a test event.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AggregateError {
    /// The event could not be interpreted.
    #[error("failed to interpret test event")]
    Parse(#[from] ParseError),

    /// Failure markers could not be read or written.
    #[error("failed to access failure markers")]
    Store(#[from] StoreError),
}

/// An error returned by a [`TestEventHandler`](crate::reporter::TestEventHandler).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReporterError {
    /// Aggregating an event failed.
    #[error("error aggregating test event")]
    Aggregate(#[from] AggregateError),

    /// Publishing results at the end of the run failed.
    #[error("error publishing results")]
    Publish(#[from] PublishError),
}

/// An error that occurred while reading test events from a stream.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EventStreamError {
    /// Reading from the stream failed.
    #[error("failed to read event stream")]
    Read(#[source] std::io::Error),

    /// A line of the stream was not a valid event.
    #[error("invalid event on line {line_number}")]
    InvalidEvent {
        /// The 1-based line number.
        line_number: usize,

        /// The underlying error.
        #[source]
        error: serde_json::Error,
    },

    /// The handler rejected an event.
    #[error("reporter failed while handling event on line {line_number}")]
    Handler {
        /// The 1-based line number, or the number of lines read for an implicit run end.
        line_number: usize,

        /// The underlying error.
        #[source]
        error: ReporterError,
    },
}

/// Displays an error along with its chain of sources, one per line.
pub struct DisplayErrorChain<E> {
    error: E,
}

impl<E: Error> DisplayErrorChain<E> {
    /// Creates a new `DisplayErrorChain`.
    pub fn new(error: E) -> Self {
        Self { error }
    }
}

impl<E: Error> fmt::Display for DisplayErrorChain<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        let mut current = self.error.source();
        while let Some(source) = current {
            write!(f, "\n  caused by:\n  - {source}")?;
            current = source.source();
        }

        Ok(())
    }
}
