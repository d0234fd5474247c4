//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ClusterConfig (validated, immutable)
//!     → Transport::from_config
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; node set and backoff constants are
//!   fixed for the life of the transport
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{BackoffConfig, ClusterConfig, NodeConfig};
pub use validation::{validate_config, ValidationError};
