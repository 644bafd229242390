// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use chrono::{DateTime, FixedOffset, TimeZone};
use serde_json::{Value, json};
use std::error::Error;
use testrail_metadata::ProjectId;
use testrail_reporter::{
    errors::ApiError,
    remote::{Credentials, HttpRequest, Method, Publisher, TestRailClient, Transport},
    reporter::{AggregatorOptions, Reporter, ResultAggregator, SuppressionPolicy},
    state::{FailureMarkers, FsStore, RunIdCache},
};

pub(crate) const PROJECT_ID: ProjectId = ProjectId::new(3);
pub(crate) const FIRST_RUN_ID: u64 = 100;
pub(crate) const EXECUTED_AT: &str = "Wed May 01 2024 12:00:00 GMT+0000";

pub(crate) fn credentials() -> Credentials {
    Credentials {
        domain: "example.testrail.io".to_owned(),
        username: "ci@example.com".to_owned(),
        password: "secret".to_owned(),
    }
}

pub(crate) fn fixed_clock() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(0)
        .expect("zero offset is valid")
        .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
        .single()
        .expect("timestamp is unambiguous")
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct RecordedRequest {
    pub(crate) method: Method,
    pub(crate) endpoint: String,
    pub(crate) body: Option<Value>,
}

/// An in-memory stand-in for the remote service.
///
/// `add_run` hands out increasing run ids starting at [`FIRST_RUN_ID`], `get_suites` returns the
/// configured suites, and `add_results_for_cases` accepts everything. Scripted responses take
/// precedence, and are used once each.
#[derive(Debug)]
pub(crate) struct RecordingTransport {
    pub(crate) requests: Vec<RecordedRequest>,
    suites: Value,
    scripted: Vec<(String, String)>,
    next_run_id: u64,
}

impl RecordingTransport {
    pub(crate) fn new() -> Self {
        Self {
            requests: Vec::new(),
            suites: json!([
                {"id": 10, "name": "Checkout"},
                {"id": 20, "name": "Accounts"},
                {"id": 30, "name": null},
            ]),
            scripted: Vec::new(),
            next_run_id: FIRST_RUN_ID,
        }
    }

    /// Responds to the next request whose endpoint starts with `endpoint_prefix` with `body`.
    pub(crate) fn script(&mut self, endpoint_prefix: &str, body: &str) {
        self.scripted
            .push((endpoint_prefix.to_owned(), body.to_owned()));
    }

    pub(crate) fn endpoints(&self) -> Vec<&str> {
        self.requests
            .iter()
            .map(|request| request.endpoint.as_str())
            .collect()
    }

    pub(crate) fn bodies_of(&self, endpoint_prefix: &str) -> Vec<&Value> {
        self.requests
            .iter()
            .filter(|request| request.endpoint.starts_with(endpoint_prefix))
            .filter_map(|request| request.body.as_ref())
            .collect()
    }
}

impl Transport for RecordingTransport {
    fn send(&mut self, request: HttpRequest<'_>) -> Result<String, Box<dyn Error + Send + Sync>> {
        let (_, endpoint) = request
            .url
            .split_once("/index.php?/api/v2/")
            .ok_or("unexpected URL")?;
        self.requests.push(RecordedRequest {
            method: request.method,
            endpoint: endpoint.to_owned(),
            body: request.body.cloned(),
        });

        if let Some(index) = self
            .scripted
            .iter()
            .position(|(prefix, _)| endpoint.starts_with(prefix.as_str()))
        {
            return Ok(self.scripted.remove(index).1);
        }

        let response = if endpoint.starts_with("add_run/") {
            let id = self.next_run_id;
            self.next_run_id += 1;
            json!({"id": id, "name": request.body.and_then(|body| body.get("name").cloned())})
        } else if endpoint.starts_with("get_suites/") {
            self.suites.clone()
        } else if endpoint.starts_with("add_results_for_cases/") {
            json!([])
        } else {
            return Err(format!("unexpected endpoint {endpoint}").into());
        };
        Ok(response.to_string())
    }
}

pub(crate) type TestReporter<'a> =
    Reporter<FsStore, Publisher<&'a mut RecordingTransport, FsStore>>;

pub(crate) struct ReporterSetup {
    pub(crate) timestamp: &'static str,
    pub(crate) suppression: SuppressionPolicy,
    pub(crate) error_handler: Option<Box<dyn FnMut(&ApiError)>>,
}

impl Default for ReporterSetup {
    fn default() -> Self {
        Self {
            timestamp: "1714564800",
            suppression: SuppressionPolicy::AnyCase,
            error_handler: None,
        }
    }
}

impl ReporterSetup {
    /// Builds a reporter over `store`, as a single invocation of the CLI would.
    pub(crate) fn build<'a>(
        self,
        store: &FsStore,
        transport: &'a mut RecordingTransport,
    ) -> TestReporter<'a> {
        let mut client = TestRailClient::new(transport, &credentials(), PROJECT_ID);
        if let Some(handler) = self.error_handler {
            client = client.with_error_handler(handler);
        }
        let cache = RunIdCache::open(store.clone(), self.timestamp).expect("run-id cache opens");
        let publisher = Publisher::new(client, cache, None);
        let aggregator = ResultAggregator::new(
            FailureMarkers::new(store.clone()),
            AggregatorOptions {
                fallback_suite: None,
                run_name: "Nightly".to_owned(),
                suppression: self.suppression,
            },
        );
        Reporter::new(aggregator, publisher).with_clock(fixed_clock)
    }
}
