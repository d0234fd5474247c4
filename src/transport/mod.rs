//! Request dispatcher: the budgeted retry loop over the node pool.
//!
//! # Responsibilities
//! - Hide multi-node failover behind one `forward_request` call
//! - Track the remaining time budget across an unbounded number of retries
//! - Distinguish retryable transport failures from fatal errors
//! - Accumulate the connection-failure trace surfaced on timeout
//!
//! # Design Decisions
//! - Budget accounting uses monotonic `Instant` deltas; elapsed time is
//!   charged whether the attempt failed or succeeded, so a slow failing node
//!   cannot stretch a bounded call forever
//! - The remaining budget also bounds each single attempt
//! - When every node is backed off, the loop waits out the soonest
//!   eligibility window (bounded by the budget) before the next attempt
//! - A configured timeout of zero makes zero attempts and times out with an
//!   empty trace

use std::collections::HashMap;
use std::time::{Duration, Instant};

use reqwest::header::HeaderMap;
use reqwest::{Client, Method};
use serde_json::Value;
use uuid::Uuid;

use crate::config::loader::ConfigError;
use crate::config::schema::{ClusterConfig, NodeConfig};
use crate::config::validation::{validate_config, ValidationError};
use crate::error::{CallError, ConnectionFailure, TransportError};
use crate::node::{NodeHandle, NodeResponse};
use crate::pool::backoff::BackoffPolicy;
use crate::pool::NodePool;

/// Fault-tolerant dispatcher for one cluster of interchangeable nodes.
///
/// Cheap to share: one instance per configured cluster, used concurrently by
/// any number of in-flight dispatch calls.
pub struct Transport {
    pool: NodePool,
    timeout: Option<Duration>,
}

impl Transport {
    /// Build a transport with the default backoff policy.
    pub fn new(nodes: &[NodeConfig], timeout: Option<Duration>) -> Result<Self, ConfigError> {
        Self::with_policy(nodes, timeout, BackoffPolicy::default())
    }

    /// Build a transport with an explicit backoff policy.
    pub fn with_policy(
        nodes: &[NodeConfig],
        timeout: Option<Duration>,
        policy: BackoffPolicy,
    ) -> Result<Self, ConfigError> {
        let client = Client::new();
        let mut errors: Vec<ValidationError> = Vec::new();
        let mut handles = Vec::with_capacity(nodes.len());

        if nodes.is_empty() {
            errors.push(ValidationError::NoNodes);
        }
        for node in nodes {
            match NodeHandle::from_config(node, client.clone()) {
                Ok(handle) => handles.push(handle),
                Err(err) => errors.push(err),
            }
        }
        if !errors.is_empty() {
            return Err(ConfigError::Validation(errors));
        }

        let pool = NodePool::new(handles, policy)?;
        tracing::info!(
            nodes = pool.len(),
            timeout = ?timeout,
            "Transport initialized"
        );

        Ok(Self { pool, timeout })
    }

    /// Build a transport from a validated configuration.
    pub fn from_config(config: &ClusterConfig) -> Result<Self, ConfigError> {
        validate_config(config).map_err(ConfigError::Validation)?;
        Self::with_policy(
            &config.nodes,
            config.timeout_secs.map(Duration::from_secs),
            BackoffPolicy::from(&config.backoff),
        )
    }

    /// The pool backing this transport.
    pub fn pool(&self) -> &NodePool {
        &self.pool
    }

    /// Deliver one logical request to some healthy node.
    ///
    /// Connection-level failures are retried against other nodes until the
    /// overall budget runs out; each retry charges the time it spent. Any
    /// other failure aborts immediately and is returned unchanged. On budget
    /// exhaustion the accumulated failure trace is returned in
    /// [`TransportError::Timeout`].
    pub async fn forward_request(
        &self,
        method: Method,
        path: Option<&str>,
        json: Option<&Value>,
        params: Option<&HashMap<String, String>>,
        headers: Option<&HeaderMap>,
    ) -> Result<NodeResponse, TransportError> {
        let request_id = Uuid::new_v4();
        let mut remaining = self.timeout;
        let mut trace: Vec<ConnectionFailure> = Vec::new();
        let mut attempt: u32 = 0;

        while remaining.map_or(true, |left| left > Duration::ZERO) {
            attempt += 1;
            let (index, node) = self.pool.select(Instant::now());

            let start = Instant::now();
            // A fully backed-off pool yields its soonest node; wait out its
            // window, bounded by the budget, instead of hammering it. The
            // pause is charged to the budget below like any attempt time.
            let wait = self.pool.eligible_in(index, start);
            if !wait.is_zero() {
                let pause = match remaining {
                    Some(left) => wait.min(left),
                    None => wait,
                };
                tokio::time::sleep(pause).await;
            }
            let outcome = node
                .request(method.clone(), path, params, json, headers, remaining)
                .await;
            // Charge the budget whether the attempt failed or not.
            let elapsed = start.elapsed();
            if let Some(left) = remaining.as_mut() {
                *left = left.saturating_sub(elapsed);
            }

            match outcome {
                Ok(response) => {
                    self.pool.report_outcome(index, true, Instant::now());
                    tracing::debug!(
                        request_id = %request_id,
                        endpoint = %node.endpoint(),
                        attempt,
                        status = %response.status,
                        "Request served"
                    );
                    return Ok(response);
                }
                Err(CallError::Connection { endpoint, source }) => {
                    self.pool.report_outcome(index, false, Instant::now());
                    tracing::warn!(
                        request_id = %request_id,
                        endpoint = %endpoint,
                        attempt,
                        error = %source,
                        "Connection failure, trying another node"
                    );
                    trace.push(ConnectionFailure {
                        endpoint,
                        error: source,
                    });
                }
                Err(CallError::Request(err)) => {
                    // The node answered; only the request itself failed.
                    self.pool.report_outcome(index, true, Instant::now());
                    tracing::debug!(
                        request_id = %request_id,
                        endpoint = %node.endpoint(),
                        attempt,
                        error = %err,
                        "Non-retryable request error"
                    );
                    return Err(TransportError::Request(err));
                }
                Err(CallError::Path { path, source }) => {
                    return Err(TransportError::Path { path, source });
                }
            }
        }

        tracing::warn!(
            request_id = %request_id,
            failures = trace.len(),
            "Time budget exhausted"
        );
        Err(TransportError::Timeout { trace })
    }
}
