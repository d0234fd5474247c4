//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Root configuration for a cluster transport.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClusterConfig {
    /// Backend node definitions. Must contain at least one entry.
    pub nodes: Vec<NodeConfig>,

    /// Overall time budget per dispatch call, in seconds.
    /// `None` means retry without bound.
    pub timeout_secs: Option<u64>,

    /// Per-node exponential backoff settings.
    pub backoff: BackoffConfig,
}

/// One backend node.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NodeConfig {
    /// Base URL of the node (e.g. "http://node-1:9984/api/v1/").
    pub endpoint: String,

    /// Headers sent with every request to this node.
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

/// Exponential backoff settings, applied per node.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct BackoffConfig {
    /// Delay after the first consecutive failure, in milliseconds.
    pub base_delay_ms: u64,

    /// Upper bound on the delay, in milliseconds. Bounds starvation when a
    /// node keeps failing.
    pub max_delay_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 1_000,
            max_delay_ms: 60_000,
        }
    }
}
