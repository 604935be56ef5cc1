//! Orchestration errors and failure classification.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ConfigError;
use crate::models::ProviderId;

/// Classification of a single failed invocation.
///
/// Every transport error collapses into one of these categories; routing
/// decisions (retry, rotate credential, trip circuit, fall back) are made
/// from the category alone, never from raw error text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Credential hit its rate limit (transient, expected)
    RateLimited,
    /// Credential was rejected outright (permanent until operator intervenes)
    AuthError,
    /// Transport-level timeout (transient)
    Timeout,
    /// Provider unreachable: 5xx, connect failure, open circuit, or empty pool
    ProviderUnavailable,
}

impl FailureKind {
    /// Whether the same credential may be retried after a backoff delay.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Timeout | Self::ProviderUnavailable)
    }

    /// Whether the failure should rotate to a different credential.
    pub fn should_rotate_credential(self) -> bool {
        matches!(self, Self::RateLimited | Self::AuthError)
    }

    /// Whether the failure counts toward opening the provider's circuit.
    ///
    /// Rate limits and bad credentials are capacity problems of a single
    /// credential, not evidence that the provider itself is down.
    pub fn should_trip_circuit(self) -> bool {
        matches!(self, Self::Timeout | Self::ProviderUnavailable)
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::RateLimited => write!(f, "rate_limited"),
            FailureKind::AuthError => write!(f, "auth_error"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::ProviderUnavailable => write!(f, "provider_unavailable"),
        }
    }
}

/// Summary of everything tried against one provider before giving up on it.
///
/// Carried inside [`OrchestratorError::Exhausted`] so callers can build a
/// user-facing message without ever seeing upstream error bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderAttempt {
    /// Provider that was tried
    pub provider: ProviderId,
    /// Number of transport invocations made against it (0 = skipped entirely)
    pub attempts: u32,
    /// Classification of the last failure observed
    pub last_failure: FailureKind,
}

/// Errors surfaced by the orchestrator.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum OrchestratorError {
    /// Rate limited by upstream and no alternative credential absorbed it
    #[error("Rate limited by {provider}{}", retry_after_secs.map(|s| format!(", retry after {}s", s)).unwrap_or_default())]
    RateLimited {
        provider: ProviderId,
        retry_after_secs: Option<u64>,
    },

    /// Credential rejected by upstream (invalid key, revoked, etc)
    #[error("Authentication failed for {provider}")]
    AuthFailed { provider: ProviderId },

    /// The caller's deadline expired before any provider produced a response
    #[error("Request timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    /// Provider has no eligible credential or its circuit is open
    #[error("Provider {provider} unavailable: {reason}")]
    ProviderUnavailable { provider: ProviderId, reason: UnavailableReason },

    /// Every provider/credential/attempt combination failed
    #[error("All providers exhausted ({} tried)", attempts.len())]
    Exhausted { attempts: Vec<ProviderAttempt> },

    /// Configuration error
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Why a provider was unusable without a single transport call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    /// Circuit breaker is open
    CircuitOpen,
    /// Every credential is disabled or rate limited
    NoEligibleCredential,
}

impl std::fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnavailableReason::CircuitOpen => write!(f, "circuit open"),
            UnavailableReason::NoEligibleCredential => write!(f, "no eligible credential"),
        }
    }
}

impl OrchestratorError {
    /// Classification of this error, if it maps to a single failed invocation.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::RateLimited { .. } => Some(FailureKind::RateLimited),
            Self::AuthFailed { .. } => Some(FailureKind::AuthError),
            Self::Timeout { .. } => Some(FailureKind::Timeout),
            Self::ProviderUnavailable { .. } => Some(FailureKind::ProviderUnavailable),
            Self::Exhausted { .. } | Self::Config(_) => None,
        }
    }

    /// Whether the caller may usefully retry the whole request later.
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::Config(_))
    }

    /// HTTP status code the calling layer should answer with.
    ///
    /// `Exhausted` deliberately maps to a generic 503: the caller shows
    /// "service temporarily unavailable, retry later", never upstream detail.
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::RateLimited { .. } => 429,
            Self::AuthFailed { .. } => 502,
            Self::Timeout { .. } => 504,
            Self::ProviderUnavailable { .. } | Self::Exhausted { .. } => 503,
            Self::Config(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhausted_serialization_roundtrip() {
        let err = OrchestratorError::Exhausted {
            attempts: vec![
                ProviderAttempt {
                    provider: ProviderId::Gemini,
                    attempts: 3,
                    last_failure: FailureKind::Timeout,
                },
                ProviderAttempt {
                    provider: ProviderId::Openrouter,
                    attempts: 0,
                    last_failure: FailureKind::ProviderUnavailable,
                },
            ],
        };

        let json = serde_json::to_string(&err).expect("serialize");
        let back: OrchestratorError = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(err, back);
    }

    #[test]
    fn test_rate_limited_display_includes_retry_hint() {
        let err = OrchestratorError::RateLimited {
            provider: ProviderId::Gemini,
            retry_after_secs: Some(42),
        };
        let msg = format!("{err}");
        assert!(msg.contains("gemini"));
        assert!(msg.contains("42"));
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(
            OrchestratorError::RateLimited {
                provider: ProviderId::Gemini,
                retry_after_secs: None
            }
            .http_status_code(),
            429
        );
        assert_eq!(
            OrchestratorError::AuthFailed { provider: ProviderId::Openrouter }.http_status_code(),
            502
        );
        assert_eq!(OrchestratorError::Timeout { elapsed_ms: 30_000 }.http_status_code(), 504);
        assert_eq!(
            OrchestratorError::ProviderUnavailable {
                provider: ProviderId::Gemini,
                reason: UnavailableReason::CircuitOpen
            }
            .http_status_code(),
            503
        );
        assert_eq!(
            OrchestratorError::Exhausted { attempts: Vec::new() }.http_status_code(),
            503
        );
    }

    #[test]
    fn test_failure_kind_routing_predicates() {
        assert!(FailureKind::Timeout.is_retryable());
        assert!(!FailureKind::AuthError.is_retryable());
        assert!(FailureKind::RateLimited.should_rotate_credential());
        assert!(!FailureKind::Timeout.should_rotate_credential());
        assert!(FailureKind::ProviderUnavailable.should_trip_circuit());
        assert!(!FailureKind::RateLimited.should_trip_circuit());
    }
}
