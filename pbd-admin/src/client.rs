//! Ticketing service REST client
//!
//! Thin wrapper over `reqwest` that knows the service layout (`/rest/api/3/...`),
//! attaches HTTP Basic credentials to every request and hands back status + body
//! without interpreting them. Classification happens in
//! [`OperationOutcome::classify`](crate::outcome::OperationOutcome::classify).

use crate::operations::Operation;
use pbd_common::Credentials;
use reqwest::header::ACCEPT;
use reqwest::{Method, Url};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("pbd-admin/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const API_PREFIX: [&str; 3] = ["rest", "api", "3"];

/// Client-level failures; no HTTP status was obtained
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Raw response: status code and body text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

/// Authenticated client bound to one service instance
pub struct ServiceClient {
    http_client: reqwest::Client,
    credentials: Credentials,
}

impl ServiceClient {
    /// `timeout` bounds each request, connection through body
    pub fn new(credentials: Credentials, timeout: Duration) -> Result<Self, ClientError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            credentials,
        })
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// `{base}/rest/api/3/{segments...}`; segments are percent-encoded
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.credentials.base_endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidEndpoint(self.credentials.base_endpoint.to_string()))?
            .pop_if_empty()
            .extend(API_PREFIX.iter().chain(segments.iter()));
        Ok(url)
    }

    /// `GET /rest/api/3/myself`
    pub async fn get_myself(&self) -> Result<HttpReply, ClientError> {
        let url = self.endpoint(&["myself"])?;
        self.send(Method::GET, url, None).await
    }

    /// `GET /rest/api/3/project/{key}`
    pub async fn get_project(&self, project_key: &str) -> Result<HttpReply, ClientError> {
        let url = self.endpoint(&["project", project_key])?;
        self.send(Method::GET, url, None).await
    }

    /// Issue the single HTTP mutation behind `operation`
    pub async fn execute(
        &self,
        project_key: &str,
        operation: &Operation,
    ) -> Result<HttpReply, ClientError> {
        let url = self.endpoint(&operation.path_segments(project_key))?;
        let payload = operation.payload();
        self.send(operation.method(), url, payload.as_ref()).await
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
    ) -> Result<HttpReply, ClientError> {
        tracing::debug!(method = %method, url = %url, "Sending request");

        let mut request = self
            .http_client
            .request(method, url)
            .basic_auth(&self.credentials.identity, Some(&self.credentials.secret))
            .header(ACCEPT, "application/json");

        if let Some(body) = body {
            // sets Content-Type: application/json
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Network(format!("unreadable response body: {}", e)))?;

        tracing::debug!(status, body_len = body.len(), "Received response");

        Ok(HttpReply { status, body })
    }
}
