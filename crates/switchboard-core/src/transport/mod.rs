//! Provider transport seam.
//!
//! The orchestrator treats each upstream as an opaque "send request, get
//! response-or-error" capability. Implementations own the wire protocol;
//! the orchestrator only ever inspects the error's classification.

mod http;

pub use http::HttpTransport;

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use switchboard_types::{AiRequest, FailureKind};

/// Raw, unnormalized response from a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderResponse {
    pub payload: Value,
}

/// Transport-level failure, already shaped into the orchestrator's taxonomy.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Upstream returned a rate-limit signal (HTTP 429 or equivalent)
    #[error("rate limited{}", retry_after.map(|d| format!(", retry after {}s", d.as_secs())).unwrap_or_default())]
    RateLimited { retry_after: Option<Duration> },

    /// Credential rejected (HTTP 401/403 or equivalent)
    #[error("authentication rejected: {message}")]
    Auth { message: String },

    /// The call did not complete within the allotted time
    #[error("timed out after {elapsed:?}")]
    Timeout { elapsed: Duration },

    /// Upstream unreachable or failing (5xx, connect error)
    #[error("provider unavailable: {message}")]
    Unavailable { message: String },
}

impl TransportError {
    /// Collapse into the routing classification.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::RateLimited { .. } => FailureKind::RateLimited,
            Self::Auth { .. } => FailureKind::AuthError,
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::Unavailable { .. } => FailureKind::ProviderUnavailable,
        }
    }

    /// Provider-advertised retry window, when one was sent.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

/// One upstream provider's transport capability.
///
/// Implementations must be cheap to share (`Arc<dyn ProviderTransport>`) and
/// must enforce `timeout` themselves; the orchestrator additionally cancels
/// the returned future when the caller's overall deadline expires.
#[async_trait]
pub trait ProviderTransport: Send + Sync {
    /// Send one request authenticated with one credential secret.
    async fn send(
        &self,
        secret: &str,
        request: &AiRequest,
        timeout: Duration,
    ) -> Result<ProviderResponse, TransportError>;

    /// Low-cost liveness check used by the background health probe.
    async fn probe(&self, secret: &str, timeout: Duration) -> Result<(), TransportError>;
}
