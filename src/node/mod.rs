//! Node handle: one backend node, one HTTP attempt.
//!
//! # Responsibilities
//! - Hold a node's immutable endpoint and default headers
//! - Issue exactly one request and decode the JSON body
//! - Classify the outcome: connection-level failure vs everything else
//!
//! # Design Decisions
//! - No retry logic here; the dispatcher owns the loop
//! - A per-attempt timeout counts as a connection failure (the node may be
//!   slow or unreachable); the overall budget is tracked by the dispatcher
//! - Any HTTP status is a response, not an error, at this layer

use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use url::Url;

use crate::config::schema::NodeConfig;
use crate::config::validation::ValidationError;
use crate::error::CallError;

/// Decoded result of one successful node attempt.
#[derive(Debug, Clone)]
pub struct NodeResponse {
    /// HTTP status returned by the node.
    pub status: StatusCode,
    /// Decoded JSON body.
    pub body: Value,
}

/// A single backend node. Read-only after construction; safe to share.
#[derive(Debug, Clone)]
pub struct NodeHandle {
    endpoint: Url,
    headers: HeaderMap,
    client: Client,
}

impl NodeHandle {
    /// Build a handle from configuration, sharing the given HTTP client.
    pub(crate) fn from_config(config: &NodeConfig, client: Client) -> Result<Self, ValidationError> {
        let endpoint =
            Url::parse(&config.endpoint).map_err(|source| ValidationError::InvalidEndpoint {
                endpoint: config.endpoint.clone(),
                source,
            })?;

        let mut headers = HeaderMap::with_capacity(config.headers.len());
        for (name, value) in &config.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes());
            let header_value = HeaderValue::from_str(value);
            match (header_name, header_value) {
                (Ok(header_name), Ok(header_value)) => {
                    headers.insert(header_name, header_value);
                }
                _ => {
                    return Err(ValidationError::InvalidHeader {
                        endpoint: config.endpoint.clone(),
                        name: name.clone(),
                    })
                }
            }
        }

        Ok(Self {
            endpoint,
            headers,
            client,
        })
    }

    /// The node's base URL.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Issue one request against this node.
    ///
    /// `timeout` bounds this single attempt. The outcome is classified into
    /// [`CallError::Connection`] (retryable) or a fatal variant; a response
    /// at any HTTP status decodes into [`NodeResponse`].
    pub async fn request(
        &self,
        method: Method,
        path: Option<&str>,
        params: Option<&HashMap<String, String>>,
        json: Option<&Value>,
        headers: Option<&HeaderMap>,
        timeout: Option<Duration>,
    ) -> Result<NodeResponse, CallError> {
        let url = self.resolve(path)?;

        let mut request = self.client.request(method, url).headers(self.headers.clone());
        if let Some(extra) = headers {
            // Per-request headers win over the node's defaults.
            request = request.headers(extra.clone());
        }
        if let Some(params) = params {
            request = request.query(params);
        }
        if let Some(json) = json {
            request = request.json(json);
        }
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|err| self.classify(err))?;
        let status = response.status();
        let body = response
            .json::<Value>()
            .await
            .map_err(|err| self.classify(err))?;

        Ok(NodeResponse { status, body })
    }

    /// Append `path` to the endpoint by concatenation, so a base URL with a
    /// path prefix keeps its prefix.
    fn resolve(&self, path: Option<&str>) -> Result<Url, CallError> {
        match path {
            None => Ok(self.endpoint.clone()),
            Some(path) => {
                let joined = format!(
                    "{}/{}",
                    self.endpoint.as_str().trim_end_matches('/'),
                    path.trim_start_matches('/')
                );
                Url::parse(&joined).map_err(|source| CallError::Path {
                    path: path.to_string(),
                    source,
                })
            }
        }
    }

    /// Split transport outcomes into the two categories the dispatcher
    /// branches on.
    fn classify(&self, err: reqwest::Error) -> CallError {
        if err.is_connect() || err.is_timeout() {
            CallError::Connection {
                endpoint: self.endpoint.clone(),
                source: err,
            }
        } else {
            CallError::Request(err)
        }
    }
}
