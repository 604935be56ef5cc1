//! Per-credential state and counters.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicI64, AtomicU32, AtomicU64, Ordering};
use std::time::Instant;

use switchboard_types::{CredentialStatus, CredentialUsage, ProviderId};

/// Health state of a single credential.
///
/// `RateLimited` expires lazily: the transition back to `Active` happens the
/// next time eligibility is checked, never via a background timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialState {
    Active,
    RateLimited { until: Instant },
    /// Permanent: credentials do not self-heal from bad auth
    Disabled,
}

/// One API key belonging to a provider, with its health state and counters.
///
/// State mutations take a per-credential lock; counters are atomics. Nothing
/// here is locked across a transport call.
#[derive(Debug)]
pub struct Credential {
    provider: ProviderId,
    label: String,
    secret: String,
    state: Mutex<CredentialState>,
    total_requests: AtomicU64,
    total_errors: AtomicU64,
    consecutive_errors: AtomicU32,
    /// Unix millis of the last invocation; 0 = never used
    last_used_ms: AtomicI64,
}

impl Credential {
    pub(crate) fn new(provider: ProviderId, label: String, secret: String) -> Self {
        Self {
            provider,
            label,
            secret,
            state: Mutex::new(CredentialState::Active),
            total_requests: AtomicU64::new(0),
            total_errors: AtomicU64::new(0),
            consecutive_errors: AtomicU32::new(0),
            last_used_ms: AtomicI64::new(0),
        }
    }

    pub fn provider(&self) -> ProviderId {
        self.provider
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Whether this credential may be handed out right now.
    ///
    /// Rate-limit expiry is computed here, at check time; a credential whose
    /// `until` equals `now` is eligible again. No background timer exists.
    pub fn is_eligible(&self, now: Instant) -> bool {
        match *self.state.lock() {
            CredentialState::Active => true,
            CredentialState::Disabled => false,
            CredentialState::RateLimited { until } => now >= until,
        }
    }

    pub fn is_disabled(&self) -> bool {
        matches!(*self.state.lock(), CredentialState::Disabled)
    }

    pub(crate) fn mark_rate_limited(&self, until: Instant) {
        let mut state = self.state.lock();
        // Disabled is terminal; a late rate-limit signal must not resurrect it
        if !matches!(*state, CredentialState::Disabled) {
            *state = CredentialState::RateLimited { until };
        }
    }

    pub(crate) fn disable(&self) {
        *self.state.lock() = CredentialState::Disabled;
    }

    pub(crate) fn note_invocation(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.last_used_ms.store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    pub(crate) fn note_success(&self) {
        self.consecutive_errors.store(0, Ordering::Relaxed);
    }

    pub(crate) fn note_error(&self) {
        self.total_errors.fetch_add(1, Ordering::Relaxed);
        self.consecutive_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    pub fn total_errors(&self) -> u64 {
        self.total_errors.load(Ordering::Relaxed)
    }

    pub fn consecutive_errors(&self) -> u32 {
        self.consecutive_errors.load(Ordering::Relaxed)
    }

    pub fn last_used(&self) -> Option<DateTime<Utc>> {
        match self.last_used_ms.load(Ordering::Relaxed) {
            0 => None,
            ms => DateTime::from_timestamp_millis(ms),
        }
    }

    /// Point-in-time counters for `Stats()`.
    pub fn usage(&self) -> CredentialUsage {
        let (status, remaining) = {
            let state = self.state.lock();
            match *state {
                CredentialState::Active => (CredentialStatus::Active, None),
                CredentialState::Disabled => (CredentialStatus::Disabled, None),
                CredentialState::RateLimited { until } => {
                    let now = Instant::now();
                    if now >= until {
                        // Expired but not yet reselected; report it as active
                        (CredentialStatus::Active, None)
                    } else {
                        (
                            CredentialStatus::RateLimited,
                            Some(until.duration_since(now).as_secs()),
                        )
                    }
                },
            }
        };

        CredentialUsage {
            label: self.label.clone(),
            provider: self.provider,
            status,
            rate_limited_remaining_secs: remaining,
            total_requests: self.total_requests(),
            total_errors: self.total_errors(),
            consecutive_errors: self.consecutive_errors(),
            last_used: self.last_used(),
        }
    }
}
