//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the node list is usable (non-empty, parseable endpoints, valid
//!   header names/values)
//! - Validate backoff value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClusterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use reqwest::header::{HeaderName, HeaderValue};
use thiserror::Error;
use url::Url;

use crate::config::schema::ClusterConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("no nodes configured")]
    NoNodes,

    #[error("invalid node endpoint '{endpoint}': {source}")]
    InvalidEndpoint {
        endpoint: String,
        source: url::ParseError,
    },

    #[error("invalid header '{name}' for node '{endpoint}'")]
    InvalidHeader { endpoint: String, name: String },

    #[error("backoff base delay must be greater than zero")]
    ZeroBaseDelay,

    #[error("backoff max delay {max_ms}ms is below base delay {base_ms}ms")]
    MaxBelowBase { base_ms: u64, max_ms: u64 },
}

/// Validate a full configuration, collecting every problem found.
pub fn validate_config(config: &ClusterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.nodes.is_empty() {
        errors.push(ValidationError::NoNodes);
    }

    for node in &config.nodes {
        if let Err(source) = Url::parse(&node.endpoint) {
            errors.push(ValidationError::InvalidEndpoint {
                endpoint: node.endpoint.clone(),
                source,
            });
        }
        for (name, value) in &node.headers {
            let name_ok = HeaderName::from_bytes(name.as_bytes()).is_ok();
            let value_ok = HeaderValue::from_str(value).is_ok();
            if !name_ok || !value_ok {
                errors.push(ValidationError::InvalidHeader {
                    endpoint: node.endpoint.clone(),
                    name: name.clone(),
                });
            }
        }
    }

    if config.backoff.base_delay_ms == 0 {
        errors.push(ValidationError::ZeroBaseDelay);
    } else if config.backoff.max_delay_ms < config.backoff.base_delay_ms {
        errors.push(ValidationError::MaxBelowBase {
            base_ms: config.backoff.base_delay_ms,
            max_ms: config.backoff.max_delay_ms,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
