//! Typed error definitions for Switchboard.
//!
//! All errors are designed to be:
//!
//! - **Serializable** for API responses via serde
//! - **Displayable** for logging via Display trait
//! - **Matchable** for routing logic via enum variants
//! - **Composable** via thiserror derive macros

mod config;
mod orchestrator;

pub use config::ConfigError;
pub use orchestrator::{FailureKind, OrchestratorError, ProviderAttempt, UnavailableReason};

/// Standard Result type using OrchestratorError.
pub type Result<T> = std::result::Result<T, OrchestratorError>;
