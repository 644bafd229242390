// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{client::TestRailClient, transport::Transport};
use crate::{
    errors::PublishError,
    reporter::{PublishRequest, ResultRecord, ResultSink},
    state::{RunIdCache, StateStore},
};
use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use testrail_metadata::{AddResultsForCases, AddRun, RunId, SuiteId, UserId};
use tracing::{debug, info, warn};

/// The display name used for suites that have no name.
pub const UNKNOWN_SUITE_NAME: &str = "unknown suite";

/// Publishes results to TestRail, creating runs as needed.
///
/// Runs are reused across invocations of the same attempt cycle through the [`RunIdCache`], so a
/// retried test run adds its results to the runs created by the first attempt.
pub struct Publisher<T, S> {
    client: TestRailClient<T>,
    cache: RunIdCache<S>,
    assigned_to: Option<UserId>,
}

impl<T: Transport, S: StateStore> Publisher<T, S> {
    /// Creates a new publisher.
    pub fn new(
        client: TestRailClient<T>,
        cache: RunIdCache<S>,
        assigned_to: Option<UserId>,
    ) -> Self {
        Self {
            client,
            cache,
            assigned_to,
        }
    }

    /// Returns the client.
    pub fn client(&self) -> &TestRailClient<T> {
        &self.client
    }

    /// Returns the run-id cache.
    pub fn cache(&self) -> &RunIdCache<S> {
        &self.cache
    }

    /// Returns the id of the run for `browser` and `suite_id`, creating the run if the cache has
    /// none.
    pub fn resolve_or_create_run(
        &mut self,
        browser: &str,
        suite_id: SuiteId,
        name: &str,
        description: &str,
    ) -> Result<RunId, PublishError> {
        if let Some(run_id) = self.cache.get(browser, suite_id)? {
            debug!("reusing run {run_id} for browser `{browser}` and suite {suite_id}");
            return Ok(run_id);
        }

        let body = AddRun {
            suite_id,
            name: name.to_owned(),
            description: description.to_owned(),
            assigned_to_id: self.assigned_to,
            include_all: true,
        };
        if let Some(run) = self.client.add_run(&body)? {
            debug!("created run {} for browser `{browser}` and suite {suite_id}", run.id);
            self.cache.insert(browser, suite_id, run.id)?;
        }

        self.cache
            .get(browser, suite_id)?
            .ok_or_else(|| PublishError::RunIdUnresolved {
                browser: browser.to_owned(),
                suite_id,
            })
    }

    /// Returns the display name of `suite_id`.
    pub fn lookup_suite_display_name(&mut self, suite_id: SuiteId) -> Result<String, PublishError> {
        let suites = self
            .client
            .get_suites()?
            .ok_or(PublishError::SuiteNotFound { suite_id })?;
        let suite = suites
            .into_iter()
            .find(|suite| suite.id == suite_id)
            .ok_or(PublishError::SuiteNotFound { suite_id })?;

        Ok(suite
            .name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| UNKNOWN_SUITE_NAME.to_owned()))
    }

    /// Publishes the results of a single suite.
    ///
    /// Records are grouped by browser, in order of first appearance, and each group is submitted
    /// as one batch to the run for that browser and suite.
    pub fn publish(&mut self, request: PublishRequest<'_>) -> Result<(), PublishError> {
        let suite_id = request.suite_id;
        if request.results.is_empty() {
            return Err(PublishError::EmptyResults { suite_id });
        }

        let suite_name = self.lookup_suite_display_name(suite_id)?;
        let executed_at = format_execution_time(&request.executed_at);

        let mut by_browser: IndexMap<&str, Vec<&ResultRecord>> = IndexMap::new();
        for record in request.results {
            by_browser
                .entry(record.browser.as_str())
                .or_default()
                .push(record);
        }

        for (browser, records) in by_browser {
            let name = format!(
                "{} on {browser}, {suite_name}: automated test run {executed_at}",
                request.run_name
            );
            let description = request.descriptor.describe(&name);
            let run_id = self.resolve_or_create_run(browser, suite_id, &name, &description)?;
            info!("results are published to {}", self.client.run_url(run_id));

            let body = AddResultsForCases {
                results: records.iter().map(|record| record.to_case_result()).collect(),
            };
            if self.client.add_results_for_cases(run_id, &body)?.is_none() {
                warn!("results for run {run_id} were not accepted");
            }
        }

        Ok(())
    }
}

impl<T: Transport, S: StateStore> ResultSink for Publisher<T, S> {
    fn publish(&mut self, request: PublishRequest<'_>) -> Result<(), PublishError> {
        Publisher::publish(self, request)
    }
}

/// Formats the execution time of a run as it appears in run names, e.g.
/// `Wed May 01 2024 12:00:00 GMT+0000`.
pub fn format_execution_time(executed_at: &DateTime<FixedOffset>) -> String {
    executed_at.format("%a %b %d %Y %H:%M:%S GMT%z").to_string()
}
