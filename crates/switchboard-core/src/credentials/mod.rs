//! Credential pools with shuffled round-robin selection.
//!
//! One pool per provider. Selection order is shuffled once at construction
//! so the first-configured key does not receive disproportionate traffic,
//! then advanced round-robin. Eligibility (rate-limit expiry) is evaluated
//! lazily at selection time.

mod state;

#[cfg(test)]
mod tests;

pub use state::{Credential, CredentialState};

use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

use switchboard_types::{CredentialUsage, FailureKind, ProviderConfig, ProviderId};

struct ProviderPool {
    /// Shuffled at construction; order is fixed for the process lifetime
    credentials: Vec<Arc<Credential>>,
    cursor: AtomicUsize,
}

/// Owns every credential and decides which one a request should use next.
pub struct CredentialPool {
    pools: HashMap<ProviderId, ProviderPool>,
    /// Providers in configuration order, for deterministic iteration
    order: Vec<ProviderId>,
    /// Cooldown applied after a rate limit when upstream sends no window
    rate_limit_cooldown: Duration,
}

impl CredentialPool {
    pub fn new(providers: &[ProviderConfig], rate_limit_cooldown: Duration) -> Self {
        let mut pools = HashMap::with_capacity(providers.len());
        let mut order = Vec::with_capacity(providers.len());

        for provider_config in providers {
            let provider = provider_config.provider;
            let mut credentials: Vec<Arc<Credential>> = provider_config
                .credentials
                .iter()
                .enumerate()
                .map(|(idx, entry)| {
                    let label = entry
                        .label
                        .clone()
                        .unwrap_or_else(|| format!("{}:key_{}", provider, idx + 1));
                    Arc::new(Credential::new(provider, label, entry.secret.clone()))
                })
                .collect();

            credentials.shuffle(&mut rand::thread_rng());

            debug!(
                provider = %provider,
                pool_size = credentials.len(),
                "credential pool initialized"
            );

            pools.insert(provider, ProviderPool { credentials, cursor: AtomicUsize::new(0) });
            order.push(provider);
        }

        Self { pools, order, rate_limit_cooldown }
    }

    /// Providers in configuration order.
    pub fn provider_ids(&self) -> Vec<ProviderId> {
        self.order.clone()
    }

    /// Next eligible credential for `provider`, or `None` when the whole
    /// pool is disabled or cooling down.
    ///
    /// O(pool size) worst case under a single atomic cursor advance;
    /// acceptable because pools are small.
    pub fn next_candidate(&self, provider: ProviderId) -> Option<Arc<Credential>> {
        let pool = self.pools.get(&provider)?;
        let len = pool.credentials.len();
        if len == 0 {
            return None;
        }

        let start = pool.cursor.fetch_add(1, Ordering::Relaxed);
        let now = Instant::now();
        for offset in 0..len {
            let credential = &pool.credentials[(start + offset) % len];
            if credential.is_eligible(now) {
                return Some(Arc::clone(credential));
            }
        }

        debug!(provider = %provider, "no eligible credential in pool");
        None
    }

    /// Whether the provider has any non-disabled credential at all.
    ///
    /// A provider where every credential is permanently disabled is unusable
    /// regardless of circuit-breaker state; rate-limited credentials still
    /// count as capacity that will return.
    pub fn has_usable_credentials(&self, provider: ProviderId) -> bool {
        self.pools
            .get(&provider)
            .is_some_and(|pool| pool.credentials.iter().any(|c| !c.is_disabled()))
    }

    /// Eligible and total credential counts for a provider, without touching
    /// any state.
    pub fn eligibility(&self, provider: ProviderId) -> (usize, usize) {
        let Some(pool) = self.pools.get(&provider) else {
            return (0, 0);
        };
        let now = Instant::now();
        let eligible = pool.credentials.iter().filter(|c| c.is_eligible(now)).count();
        (eligible, pool.credentials.len())
    }

    /// A secret for read-only probing, without advancing the cursor or
    /// touching any state.
    pub fn peek_secret(&self, provider: ProviderId) -> Option<String> {
        let pool = self.pools.get(&provider)?;
        pool.credentials
            .iter()
            .find(|c| !c.is_disabled())
            .map(|c| c.secret().to_string())
    }

    pub fn record_success(&self, credential: &Credential) {
        credential.note_invocation();
        credential.note_success();
    }

    pub fn record_failure(
        &self,
        credential: &Credential,
        kind: FailureKind,
        retry_after: Option<Duration>,
    ) {
        credential.note_invocation();
        credential.note_error();

        match kind {
            FailureKind::RateLimited => {
                let cooldown = retry_after.unwrap_or(self.rate_limit_cooldown);
                credential.mark_rate_limited(Instant::now() + cooldown);
                warn!(
                    provider = %credential.provider(),
                    credential = %credential.label(),
                    cooldown_secs = cooldown.as_secs(),
                    "credential rate limited, cooling down"
                );
            },
            FailureKind::AuthError => {
                credential.disable();
                // Capacity-reducing event requiring operator action
                error!(
                    provider = %credential.provider(),
                    credential = %credential.label(),
                    "credential permanently disabled after auth rejection"
                );
            },
            FailureKind::Timeout | FailureKind::ProviderUnavailable => {},
        }
    }

    /// Counters for every credential, in a stable (shuffled-once) order.
    pub fn credential_usage(&self) -> Vec<CredentialUsage> {
        self.order
            .iter()
            .filter_map(|provider| self.pools.get(provider))
            .flat_map(|pool| pool.credentials.iter().map(|c| c.usage()))
            .collect()
    }
}
