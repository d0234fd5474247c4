//! Observability subsystem.
//!
//! # Design Decisions
//! - Structured logging via tracing; every dispatch call carries a
//!   request id through its events
//! - Log level configurable via environment

pub mod logging;
