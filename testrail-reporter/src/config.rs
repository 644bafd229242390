// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reporter configuration.
//!
//! Configuration is read from, in increasing order of precedence:
//!
//! 1. a TOML file, by default `.config/testrail.toml` relative to the working directory;
//! 2. environment variables prefixed with `TESTRAIL_`, e.g. `TESTRAIL_PROJECT_ID`;
//! 3. overrides set on the command line.
//!
//! ```toml
//! domain = "example.testrail.io"
//! username = "ci@example.com"
//! password = "api-key"
//! project_id = 3
//! timestamp = "1714564800"
//! suite_id = "S10"
//! run_name = "Nightly"
//! ```

use crate::{
    errors::ConfigError,
    ids::{SuiteToken, parse_suite_digits},
    remote::Credentials,
    reporter::{AggregatorOptions, SuppressionPolicy},
    state::reporter_state_dir,
};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::collections::BTreeSet;
use testrail_metadata::{IdParseError, ProjectId, UserId};
use tracing::warn;

/// The default location of the config file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".config/testrail.toml";

/// The prefix of configuration environment variables, without the trailing `_`.
pub const CONFIG_ENV_PREFIX: &str = "TESTRAIL";

/// The run name used if none is configured.
pub const DEFAULT_RUN_NAME: &str = "TestRail reporter";

// `TESTRAIL_STATE_DIR` names a base directory and is read by `reporter_state_dir`, so `state_dir`
// is not read from the environment.
const ENV_KEYS: &[&str] = &[
    "domain",
    "username",
    "password",
    "project_id",
    "timestamp",
    "suite_id",
    "assigned_to_id",
    "run_name",
    "suppression",
];

/// Receives warnings produced while reading the configuration.
pub trait ConfigWarnings {
    /// Handle unknown configuration keys.
    fn unknown_config_keys(&mut self, config_file: Option<&Utf8Path>, unknown: &BTreeSet<String>);
}

/// Logs configuration warnings through `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultConfigWarnings;

impl ConfigWarnings for DefaultConfigWarnings {
    fn unknown_config_keys(&mut self, config_file: Option<&Utf8Path>, unknown: &BTreeSet<String>) {
        let location = match config_file {
            Some(path) => format!(" in `{path}`"),
            None => String::new(),
        };
        let keys = unknown.iter().map(String::as_str).collect::<Vec<_>>().join(", ");
        warn!(
            "ignoring unknown configuration key{}{location}: {keys}",
            if unknown.len() == 1 { "" } else { "s" },
        );
    }
}

#[derive(Clone, Debug)]
enum FileSource {
    Path { path: Utf8PathBuf, required: bool },
    Inline(String),
}

/// The sources the reporter configuration is read from.
#[derive(Clone, Debug, Default)]
pub struct ConfigSources {
    file: Option<FileSource>,
    env: config::Map<String, String>,
    overrides: Vec<(&'static str, String)>,
}

impl ConfigSources {
    /// Creates an empty set of sources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the config file from its default location under `working_dir`, if it exists.
    pub fn default_file(self, working_dir: &Utf8Path) -> Self {
        self.file_source(FileSource::Path {
            path: working_dir.join(DEFAULT_CONFIG_FILE),
            required: false,
        })
    }

    /// Reads the config file at `path`, which must exist.
    pub fn file(self, path: impl Into<Utf8PathBuf>) -> Self {
        self.file_source(FileSource::Path {
            path: path.into(),
            required: true,
        })
    }

    /// Reads the config file contents from a string.
    pub fn toml(self, contents: impl Into<String>) -> Self {
        self.file_source(FileSource::Inline(contents.into()))
    }

    fn file_source(mut self, source: FileSource) -> Self {
        self.file = Some(source);
        self
    }

    /// Reads configuration from the environment of this process.
    pub fn process_env(self) -> Self {
        self.env_vars(std::env::vars())
    }

    /// Reads configuration from `vars`. Variables not naming a configuration key are ignored.
    pub fn env_vars(mut self, vars: impl IntoIterator<Item = (String, String)>) -> Self {
        let prefix = format!("{CONFIG_ENV_PREFIX}_");
        for (name, value) in vars {
            let is_known = name
                .strip_prefix(&prefix)
                .is_some_and(|key| ENV_KEYS.contains(&key.to_ascii_lowercase().as_str()));
            if is_known {
                self.env.insert(name, value);
            }
        }
        self
    }

    /// Overrides the value of `key`.
    pub fn set_override(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.overrides.push((key, value.into()));
        self
    }

    /// Reads and validates the configuration.
    pub fn load(&self, warnings: &mut impl ConfigWarnings) -> Result<ReporterConfig, ConfigError> {
        self.deserialize(warnings)?.into_config()
    }

    /// Reads only the state directory setting, for operations that don't talk to the service.
    ///
    /// Returns the configured `state_dir`, or the platform state directory for `working_dir`.
    pub fn load_state_dir(
        &self,
        working_dir: &Utf8Path,
        warnings: &mut impl ConfigWarnings,
    ) -> Result<Utf8PathBuf, ConfigError> {
        let deserialized = self.deserialize(warnings)?;
        resolve_state_dir(deserialized.state_dir.as_deref(), working_dir)
    }

    fn config_file(&self) -> Option<&Utf8Path> {
        match &self.file {
            Some(FileSource::Path { path, .. }) => Some(path),
            _ => None,
        }
    }

    fn deserialize(
        &self,
        warnings: &mut impl ConfigWarnings,
    ) -> Result<DeserializedReporterConfig, ConfigError> {
        let read_error = |err: config::ConfigError| ConfigError::Read {
            config_file: self.config_file().map(ToOwned::to_owned),
            err,
        };

        let mut builder = Config::builder();
        match &self.file {
            Some(FileSource::Path { path, required }) => {
                builder = builder
                    .add_source(File::new(path.as_str(), FileFormat::Toml).required(*required));
            }
            Some(FileSource::Inline(contents)) => {
                builder = builder.add_source(File::from_str(contents, FileFormat::Toml));
            }
            None => {}
        }
        builder = builder.add_source(
            Environment::with_prefix(CONFIG_ENV_PREFIX).source(Some(self.env.clone())),
        );
        for (key, value) in &self.overrides {
            builder = builder
                .set_override(*key, value.as_str())
                .map_err(read_error)?;
        }

        let config = builder.build().map_err(read_error)?;

        let mut unknown = BTreeSet::new();
        let deserialized: DeserializedReporterConfig =
            serde_ignored::deserialize(config, |path: serde_ignored::Path| {
                unknown.insert(path.to_string());
            })
            .map_err(read_error)?;
        if !unknown.is_empty() {
            warnings.unknown_config_keys(self.config_file(), &unknown);
        }

        Ok(deserialized)
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
struct DeserializedReporterConfig {
    domain: Option<String>,
    username: Option<String>,
    password: Option<String>,
    project_id: Option<String>,
    timestamp: Option<String>,
    suite_id: Option<String>,
    assigned_to_id: Option<String>,
    run_name: Option<String>,
    suppression: Option<SuppressionPolicy>,
    state_dir: Option<Utf8PathBuf>,
}

impl DeserializedReporterConfig {
    fn into_config(self) -> Result<ReporterConfig, ConfigError> {
        let domain = required("domain", self.domain)?;
        let username = required("username", self.username)?;
        let password = required("password", self.password)?;
        let project_id = required("project_id", self.project_id)?;
        let project_id = parse_value("project_id", &project_id, |s| s.parse::<ProjectId>())?;
        let timestamp = required("timestamp", self.timestamp)?;

        let fallback_suite = match self.suite_id {
            Some(token) => {
                parse_value("suite_id", &token, parse_suite_digits)?;
                Some(SuiteToken::new(token.trim()))
            }
            None => None,
        };
        let assigned_to_id = self
            .assigned_to_id
            .map(|id| parse_value("assigned_to_id", &id, |s| s.parse::<UserId>()))
            .transpose()?;

        Ok(ReporterConfig {
            credentials: Credentials {
                domain,
                username,
                password,
            },
            project_id,
            timestamp,
            fallback_suite,
            assigned_to_id,
            run_name: self
                .run_name
                .unwrap_or_else(|| DEFAULT_RUN_NAME.to_owned()),
            suppression: self.suppression.unwrap_or_default(),
            state_dir: self.state_dir,
        })
    }
}

fn required(name: &'static str, value: Option<String>) -> Result<String, ConfigError> {
    value.ok_or(ConfigError::MissingField { name })
}

fn parse_value<T>(
    name: &'static str,
    input: &str,
    parse: impl FnOnce(&str) -> Result<T, IdParseError>,
) -> Result<T, ConfigError> {
    parse(input).map_err(|err| ConfigError::InvalidValue {
        name,
        input: input.to_owned(),
        err,
    })
}

fn resolve_state_dir(
    configured: Option<&Utf8Path>,
    working_dir: &Utf8Path,
) -> Result<Utf8PathBuf, ConfigError> {
    match configured {
        Some(dir) if dir.is_relative() => Ok(working_dir.join(dir)),
        Some(dir) => Ok(dir.to_owned()),
        None => Ok(reporter_state_dir(working_dir)?),
    }
}

/// Validated reporter configuration.
#[derive(Clone, Debug)]
pub struct ReporterConfig {
    /// Where and as whom to connect.
    pub credentials: Credentials,

    /// The project results are reported to.
    pub project_id: ProjectId,

    /// The timestamp identifying this attempt cycle.
    pub timestamp: String,

    /// The suite used for tests whose full title has no suite token.
    pub fallback_suite: Option<SuiteToken>,

    /// The user created runs are assigned to.
    pub assigned_to_id: Option<UserId>,

    /// The name prefix of created runs.
    pub run_name: String,

    /// How passes for cases that failed earlier in the cycle are treated.
    pub suppression: SuppressionPolicy,

    /// The configured state directory, if any.
    pub state_dir: Option<Utf8PathBuf>,
}

impl ReporterConfig {
    /// Returns the options for the result aggregator.
    pub fn aggregator_options(&self) -> AggregatorOptions {
        AggregatorOptions {
            fallback_suite: self.fallback_suite.clone(),
            run_name: self.run_name.clone(),
            suppression: self.suppression,
        }
    }

    /// Returns the directory reporter state is kept in.
    ///
    /// This is the configured `state_dir` (relative paths are resolved against `working_dir`), or
    /// the platform state directory for `working_dir`.
    pub fn state_dir(&self, working_dir: &Utf8Path) -> Result<Utf8PathBuf, ConfigError> {
        resolve_state_dir(self.state_dir.as_deref(), working_dir)
    }
}
