// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::transport::{HttpRequest, Method, Transport};
use crate::errors::ApiError;
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Serialize, de::DeserializeOwned};
use std::fmt;
use testrail_metadata::{
    AddCase, AddResultsForCases, AddRun, AddSection, CaseSummary, ProjectId, RunId, RunSummary,
    SectionId, SectionSummary, SectionsResponse, SuiteId, SuiteSummary,
};
use tracing::debug;

/// Credentials and location of a TestRail instance.
#[derive(Clone, Eq, PartialEq)]
pub struct Credentials {
    /// The domain of the instance, e.g. `example.testrail.io`.
    pub domain: String,

    /// The user to authenticate as.
    pub username: String,

    /// The password or API key of the user.
    pub password: String,
}

impl Credentials {
    fn authorization(&self) -> String {
        let token = STANDARD.encode(format!("{}:{}", self.username, self.password));
        format!("Basic {token}")
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("domain", &self.domain)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Receives error messages returned by the service instead of having them raised.
pub type ErrorHandler = Box<dyn FnMut(&ApiError)>;

/// A client for the TestRail API v2.
///
/// Every operation returns `Ok(None)` if the service returned an error and an [`ErrorHandler`] was
/// installed to receive it. Without a handler, such errors are returned as [`ApiError::Remote`].
pub struct TestRailClient<T> {
    transport: T,
    domain: String,
    authorization: String,
    project_id: ProjectId,
    on_error: Option<ErrorHandler>,
}

impl<T: Transport> TestRailClient<T> {
    /// Creates a new client for the project `project_id`.
    pub fn new(transport: T, credentials: &Credentials, project_id: ProjectId) -> Self {
        Self {
            transport,
            domain: credentials.domain.clone(),
            authorization: credentials.authorization(),
            project_id,
            on_error: None,
        }
    }

    /// Installs a handler that receives errors returned by the service.
    pub fn with_error_handler(mut self, handler: impl FnMut(&ApiError) + 'static) -> Self {
        self.on_error = Some(Box::new(handler));
        self
    }

    /// Returns the project this client operates on.
    pub fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns the URL of the web page of a run.
    pub fn run_url(&self, run_id: RunId) -> String {
        format!("https://{}/index.php?/runs/view/{run_id}", self.domain)
    }

    /// Returns the URL of an API endpoint, e.g. `add_run/1`.
    pub fn api_url(&self, endpoint: &str) -> String {
        format!("https://{}/index.php?/api/v2/{endpoint}", self.domain)
    }

    /// Creates a run in the project.
    pub fn add_run(&mut self, body: &AddRun) -> Result<Option<RunSummary>, ApiError> {
        let endpoint = format!("add_run/{}", self.project_id);
        self.post(endpoint, body)
    }

    /// Adds a batch of results to a run.
    pub fn add_results_for_cases(
        &mut self,
        run_id: RunId,
        body: &AddResultsForCases,
    ) -> Result<Option<serde_json::Value>, ApiError> {
        self.post(format!("add_results_for_cases/{run_id}"), body)
    }

    /// Returns every suite in the project.
    pub fn get_suites(&mut self) -> Result<Option<Vec<SuiteSummary>>, ApiError> {
        let endpoint = format!("get_suites/{}", self.project_id);
        self.get(endpoint)
    }

    /// Returns the sections of a suite.
    pub fn get_sections(
        &mut self,
        suite_id: SuiteId,
    ) -> Result<Option<Vec<SectionSummary>>, ApiError> {
        let endpoint = format!("get_sections/{}&suite_id={suite_id}", self.project_id);
        Ok(self
            .get::<SectionsResponse>(endpoint)?
            .map(SectionsResponse::into_sections))
    }

    /// Creates a section in the project.
    pub fn add_section(&mut self, body: &AddSection) -> Result<Option<SectionSummary>, ApiError> {
        let endpoint = format!("add_section/{}", self.project_id);
        self.post(endpoint, body)
    }

    /// Creates a case in a section.
    pub fn add_case(
        &mut self,
        section_id: SectionId,
        body: &AddCase,
    ) -> Result<Option<CaseSummary>, ApiError> {
        self.post(format!("add_case/{section_id}"), body)
    }

    fn get<R: DeserializeOwned>(&mut self, endpoint: String) -> Result<Option<R>, ApiError> {
        self.request(Method::Get, endpoint, None)
    }

    fn post<B: Serialize, R: DeserializeOwned>(
        &mut self,
        endpoint: String,
        body: &B,
    ) -> Result<Option<R>, ApiError> {
        let body = serde_json::to_value(body).map_err(|error| ApiError::Encode {
            endpoint: endpoint.clone(),
            error,
        })?;
        self.request(Method::Post, endpoint, Some(&body))
    }

    fn request<R: DeserializeOwned>(
        &mut self,
        method: Method,
        endpoint: String,
        body: Option<&serde_json::Value>,
    ) -> Result<Option<R>, ApiError> {
        let url = self.api_url(&endpoint);
        let response = self
            .transport
            .send(HttpRequest {
                method,
                url: &url,
                authorization: &self.authorization,
                body,
            })
            .map_err(|error| ApiError::Transport {
                method: method.as_str(),
                url: url.clone(),
                error,
            })?;

        let value: serde_json::Value =
            serde_json::from_str(&response).map_err(|error| ApiError::Decode {
                endpoint: endpoint.clone(),
                error,
            })?;

        if let Some(message) = error_message(&value) {
            debug!("{endpoint} returned an error: {message}");
            let err = ApiError::Remote { endpoint, message };
            return match &mut self.on_error {
                Some(handler) => {
                    handler(&err);
                    Ok(None)
                }
                None => Err(err),
            };
        }

        debug!("{endpoint} succeeded");
        serde_json::from_value(value)
            .map(Some)
            .map_err(|error| ApiError::Decode { endpoint, error })
    }
}

/// Returns the message of an error response, if `value` is one.
fn error_message(value: &serde_json::Value) -> Option<String> {
    let error = value.as_object()?.get("error")?;
    match error {
        serde_json::Value::Null => None,
        serde_json::Value::String(message) => Some(message.clone()),
        other => Some(other.to_string()),
    }
}
