//! Thread-safe usage counters and on-demand snapshots.
//!
//! Provider-level counters live here; credential-level numbers live on the
//! credentials themselves. `snapshot()` reads both at the moment of the call,
//! so there is never a second copy of the counts to keep in sync.

#[cfg(test)]
mod tests;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use switchboard_types::{ProviderId, ProviderUsage, UsageSnapshot};

use crate::credentials::CredentialPool;

#[derive(Debug, Default)]
struct ProviderCounters {
    total_requests: AtomicU64,
    success_count: AtomicU64,
    error_count: AtomicU64,
    /// Unix millis of the last invocation; 0 = never used
    last_used_ms: AtomicI64,
}

/// Per-provider request/error accounting.
#[derive(Debug, Default)]
pub struct UsageRecorder {
    providers: DashMap<ProviderId, ProviderCounters>,
}

impl UsageRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, provider: ProviderId) {
        let counters = self.providers.entry(provider).or_default();
        counters.total_requests.fetch_add(1, Ordering::Relaxed);
        counters.success_count.fetch_add(1, Ordering::Relaxed);
        counters.last_used_ms.store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    pub fn record_error(&self, provider: ProviderId) {
        let counters = self.providers.entry(provider).or_default();
        counters.total_requests.fetch_add(1, Ordering::Relaxed);
        counters.error_count.fetch_add(1, Ordering::Relaxed);
        counters.last_used_ms.store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    pub fn provider_usage(&self, provider: ProviderId) -> ProviderUsage {
        match self.providers.get(&provider) {
            Some(counters) => ProviderUsage {
                provider,
                total_requests: counters.total_requests.load(Ordering::Relaxed),
                success_count: counters.success_count.load(Ordering::Relaxed),
                error_count: counters.error_count.load(Ordering::Relaxed),
                last_used: to_datetime(counters.last_used_ms.load(Ordering::Relaxed)),
            },
            None => ProviderUsage {
                provider,
                total_requests: 0,
                success_count: 0,
                error_count: 0,
                last_used: None,
            },
        }
    }

    /// Aggregated, point-in-time read of all counters.
    pub fn snapshot(&self, pool: &CredentialPool) -> UsageSnapshot {
        UsageSnapshot {
            generated_at: Utc::now(),
            providers: pool.provider_ids().into_iter().map(|p| self.provider_usage(p)).collect(),
            credentials: pool.credential_usage(),
        }
    }
}

fn to_datetime(ms: i64) -> Option<DateTime<Utc>> {
    match ms {
        0 => None,
        ms => DateTime::from_timestamp_millis(ms),
    }
}
