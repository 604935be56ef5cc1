//! Configuration errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::ProviderId;

/// Errors raised while loading or validating orchestrator configuration.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Cannot read config file {path}: {message}")]
    Io { path: String, message: String },

    /// Config file could not be parsed
    #[error("Cannot parse config file {path}: {message}")]
    Parse { path: String, message: String },

    /// Config parsed but failed validation
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    /// A provider was configured without any credentials
    #[error("No credentials configured for provider {provider}")]
    NoCredentials { provider: ProviderId },

    /// The same provider appears more than once
    #[error("Provider {provider} configured more than once")]
    DuplicateProvider { provider: ProviderId },
}
