//! Logical request and normalized response shapes.
//!
//! The orchestrator does no prompt formatting: payloads cross the boundary as
//! opaque JSON and the caller owns their structure.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ProviderId;

/// A single logical "make this AI call" request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiRequest {
    /// Model identifier the caller wants, passed through to the transport
    pub model: String,
    /// Opaque request body (prompt, parameters, tools)
    pub payload: Value,
}

impl AiRequest {
    pub fn new(model: impl Into<String>, payload: Value) -> Self {
        Self { model: model.into(), payload }
    }
}

/// A successful, normalized outcome of [`AiRequest`] execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    /// Opaque response body from the serving provider
    pub payload: Value,
    /// Provider that served the request
    pub provider: ProviderId,
    /// Label of the credential that served it (e.g. "gemini:key_3")
    pub credential: String,
    /// Total transport invocations across all providers, including failures
    pub attempts: u32,
}
