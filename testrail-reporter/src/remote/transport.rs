// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::{error::Error, fmt, time::Duration};
use tracing::debug;
use ureq::Agent;

/// The method of an HTTP request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
}

impl Method {
    /// Returns the method as written in a request line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to the remote service.
#[derive(Clone, Debug)]
pub struct HttpRequest<'a> {
    /// The request method.
    pub method: Method,

    /// The full URL.
    pub url: &'a str,

    /// The value of the `Authorization` header.
    pub authorization: &'a str,

    /// The JSON body, for `POST` requests.
    pub body: Option<&'a serde_json::Value>,
}

/// Sends requests to the remote service.
///
/// Implementations return the response body regardless of the response status, since the service
/// reports errors as JSON bodies with an `error` field.
pub trait Transport {
    /// Sends `request` and returns the response body.
    fn send(&mut self, request: HttpRequest<'_>) -> Result<String, Box<dyn Error + Send + Sync>>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, request: HttpRequest<'_>) -> Result<String, Box<dyn Error + Send + Sync>> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, request: HttpRequest<'_>) -> Result<String, Box<dyn Error + Send + Sync>> {
        (**self).send(request)
    }
}

/// A blocking [`Transport`] backed by `ureq`.
#[derive(Debug)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    /// The default timeout for a single request.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// Creates a new transport with the default timeout.
    pub fn new() -> Self {
        Self::with_timeout(Self::DEFAULT_TIMEOUT)
    }

    /// Creates a new transport with the given per-request timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        let agent: Agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn send(&mut self, request: HttpRequest<'_>) -> Result<String, Box<dyn Error + Send + Sync>> {
        debug!("{} {}", request.method, request.url);
        let response = match (request.method, request.body) {
            (Method::Get, _) => self
                .agent
                .get(request.url)
                .header("Authorization", request.authorization)
                .header("Content-Type", "application/json")
                .call()?,
            (Method::Post, Some(body)) => self
                .agent
                .post(request.url)
                .header("Authorization", request.authorization)
                .send_json(body)?,
            (Method::Post, None) => self
                .agent
                .post(request.url)
                .header("Authorization", request.authorization)
                .header("Content-Type", "application/json")
                .send_empty()?,
        };

        debug!("response status: {}", response.status());
        let body = response.into_body().read_to_string()?;
        Ok(body)
    }
}
