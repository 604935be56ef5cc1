//! Usage and health snapshot models.
//!
//! Snapshots are computed on demand from live counters; nothing here is a
//! second copy of state that could drift.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ProviderId;

/// Externally visible credential state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialStatus {
    /// Eligible for selection
    Active,
    /// Cooling down after a rate limit
    RateLimited,
    /// Permanently removed from rotation (auth rejected)
    Disabled,
}

impl std::fmt::Display for CredentialStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialStatus::Active => write!(f, "active"),
            CredentialStatus::RateLimited => write!(f, "rate_limited"),
            CredentialStatus::Disabled => write!(f, "disabled"),
        }
    }
}

/// Point-in-time counters for a single credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialUsage {
    pub label: String,
    pub provider: ProviderId,
    pub status: CredentialStatus,
    /// Remaining cooldown when `status` is `RateLimited`
    pub rate_limited_remaining_secs: Option<u64>,
    pub total_requests: u64,
    pub total_errors: u64,
    pub consecutive_errors: u32,
    pub last_used: Option<DateTime<Utc>>,
}

/// Point-in-time counters for a provider across its whole pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderUsage {
    pub provider: ProviderId,
    pub total_requests: u64,
    pub success_count: u64,
    pub error_count: u64,
    pub last_used: Option<DateTime<Utc>>,
}

/// Aggregated, point-in-time read of all credential and provider counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    pub generated_at: DateTime<Utc>,
    pub providers: Vec<ProviderUsage>,
    pub credentials: Vec<CredentialUsage>,
}

/// Operational health verdict for a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Circuit closed, eligible credentials available, last probe succeeded
    Ok,
    /// Usable but impaired (partial pool, rate limiting, circuit half-open)
    Degraded,
    /// No path to the provider right now
    Down,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Ok => write!(f, "ok"),
            HealthStatus::Degraded => write!(f, "degraded"),
            HealthStatus::Down => write!(f, "down"),
        }
    }
}

/// Health verdict for one provider, with probe recency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderHealth {
    pub provider: ProviderId,
    pub status: HealthStatus,
    /// When the background probe last ran, if it has run at all
    pub probed_at: Option<DateTime<Utc>>,
}

/// Health verdicts for every configured provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub generated_at: DateTime<Utc>,
    pub providers: Vec<ProviderHealth>,
}
