//! Orchestrator configuration models.
//!
//! Deserialized once at startup from a JSON file; there is no dynamic
//! credential reload. Defaults follow the upstream-facing behavior described
//! in the module docs of `switchboard-core`.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

use super::ProviderId;

/// One API key belonging to a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialEntry {
    /// Opaque secret value (API key)
    pub secret: String,
    /// Human-readable label; generated as "<provider>:key_<n>" when absent
    #[serde(default)]
    pub label: Option<String>,
}

/// Per-provider configuration: endpoint override plus the credential pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub provider: ProviderId,
    /// Base URL override for the provider's transport (tests, proxies)
    #[serde(default)]
    pub base_url: Option<String>,
    /// Ordered credential list; order is only cosmetic, selection shuffles it
    pub credentials: Vec<CredentialEntry>,
}

/// Retry/backoff tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum transport invocations per provider per request
    pub max_attempts: u32,
    /// Base delay for the exponential schedule, in milliseconds
    pub base_delay_ms: u64,
    /// Ceiling for the exponential schedule, in milliseconds
    pub max_delay_ms: u64,
    /// Apply uniform random jitter in [0, delay] to desynchronize retriers
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_attempts: 3, base_delay_ms: 500, max_delay_ms: 30_000, jitter: true }
    }
}

/// Circuit breaker tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Consecutive failures before the circuit opens
    pub failure_threshold: u32,
    /// Seconds the circuit stays open before admitting a trial probe
    pub open_duration_secs: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self { failure_threshold: 5, open_duration_secs: 60 }
    }
}

/// Top-level orchestrator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    pub providers: Vec<ProviderConfig>,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub breaker: BreakerConfig,
    /// Fallback cooldown after a rate limit when upstream sends no Retry-After
    #[serde(default = "default_rate_limit_cooldown_secs")]
    pub rate_limit_cooldown_secs: u64,
    /// Per-invocation transport timeout
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Interval between background health probes
    #[serde(default = "default_health_probe_interval_secs")]
    pub health_probe_interval_secs: u64,
}

fn default_rate_limit_cooldown_secs() -> u64 {
    60
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_health_probe_interval_secs() -> u64 {
    300
}

impl OrchestratorConfig {
    /// Validate invariants that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.providers.is_empty() {
            return Err(ConfigError::Invalid { message: "no providers configured".to_string() });
        }

        let mut seen = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            if seen.contains(&provider.provider) {
                return Err(ConfigError::DuplicateProvider { provider: provider.provider });
            }
            seen.push(provider.provider);

            if provider.credentials.is_empty() {
                return Err(ConfigError::NoCredentials { provider: provider.provider });
            }
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                message: "retry.max_attempts must be at least 1".to_string(),
            });
        }
        if self.breaker.failure_threshold == 0 {
            return Err(ConfigError::Invalid {
                message: "breaker.failure_threshold must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}
