//! Fault-tolerant request dispatcher for clusters of interchangeable
//! HTTP backend nodes.
//!
//! # Architecture Overview
//!
//! ```text
//! caller
//!   │ forward_request(method, path, json, params, headers)
//!   ▼
//! ┌────────────┐   select(now)    ┌──────────────┐
//! │ transport  │────────────────▶ │    pool      │
//! │ (budgeted  │                  │ round-robin  │
//! │ retry loop)│ ◀────────────────│ + backoff    │
//! └─────┬──────┘  report_outcome  └──────────────┘
//!       │ one attempt, bounded by the remaining budget
//!       ▼
//! ┌────────────┐
//! │    node    │──▶ backend node (HTTP)
//! └────────────┘
//! ```
//!
//! A logical request is delivered to *some* healthy node. Connection-level
//! failures (DNS, refused, reset, handshake, per-attempt timeout) are retried
//! against other nodes; every other outcome is final. Each node carries its
//! own exponential backoff state, shared across dispatch calls for the life
//! of the `Transport`, so an unreliable node is deprioritized no matter how
//! many separate requests are made.

pub mod config;
pub mod error;
pub mod node;
pub mod observability;
pub mod pool;
pub mod transport;

pub use config::schema::{BackoffConfig, ClusterConfig, NodeConfig};
pub use config::ConfigError;
pub use error::{ConnectionFailure, TransportError};
pub use node::NodeResponse;
pub use pool::backoff::BackoffPolicy;
pub use transport::Transport;

// Callers name HTTP methods with the collaborator's type.
pub use reqwest::Method;
