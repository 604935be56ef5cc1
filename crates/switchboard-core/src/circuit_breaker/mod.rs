//! Circuit breaker for provider-level fast-fail behavior.
//!
//! One circuit per provider. After `failure_threshold` consecutive failures
//! the circuit opens and calls short-circuit without consuming a credential
//! or touching the network. After `open_duration` a single trial call is
//! admitted; its outcome decides between closing and re-opening.
//!
//! States:
//! - Closed: normal operation, requests pass through
//! - Open: provider is failing, requests fail immediately
//! - HalfOpen: testing recovery, exactly one probe in flight

mod state;

#[cfg(test)]
mod tests;

use state::ProviderCircuit;
pub use state::CircuitState;

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use switchboard_types::{BreakerConfig, FailureKind, ProviderId};

/// Verdict for one call against one provider.
pub enum CircuitDecision<'a> {
    /// Circuit closed; proceed normally
    Allow,
    /// Circuit half-open; proceed as the single trial call. The guard must be
    /// held for the duration of the call so a cancelled probe releases the
    /// gate.
    AllowProbe(ProbeGuard<'a>),
    /// Short-circuit without any transport call
    Reject,
}

impl CircuitDecision<'_> {
    pub fn is_reject(&self) -> bool {
        matches!(self, Self::Reject)
    }
}

/// Releases the HalfOpen probe gate if the probe never reported an outcome
/// (caller cancelled mid-flight).
pub struct ProbeGuard<'a> {
    manager: &'a CircuitBreakerManager,
    provider: ProviderId,
}

impl Drop for ProbeGuard<'_> {
    fn drop(&mut self) {
        let mut circuits = self.manager.circuits.write();
        if let Some(circuit) = circuits.get_mut(&self.provider) {
            if circuit.state == CircuitState::HalfOpen && circuit.probe_in_flight {
                debug!(provider = %self.provider, "probe abandoned, releasing half-open gate");
                circuit.probe_in_flight = false;
            }
        }
    }
}

/// Manages circuit breakers for all providers.
#[derive(Debug)]
pub struct CircuitBreakerManager {
    failure_threshold: u32,
    open_duration: Duration,
    circuits: RwLock<HashMap<ProviderId, ProviderCircuit>>,
    total_trips: AtomicU64,
}

impl CircuitBreakerManager {
    pub fn new(config: BreakerConfig) -> Self {
        Self::with_settings(config.failure_threshold, Duration::from_secs(config.open_duration_secs))
    }

    pub fn with_settings(failure_threshold: u32, open_duration: Duration) -> Self {
        Self {
            failure_threshold,
            open_duration,
            circuits: RwLock::new(HashMap::new()),
            total_trips: AtomicU64::new(0),
        }
    }

    /// Decide whether a call against `provider` may proceed.
    ///
    /// Open circuits transition to HalfOpen lazily here once the open
    /// duration has elapsed; the caller making that transition becomes the
    /// probe. While a probe is in flight every other caller is rejected as
    /// if the circuit were still Open.
    pub fn check(&self, provider: ProviderId) -> CircuitDecision<'_> {
        let mut circuits = self.circuits.write();
        let circuit = circuits.entry(provider).or_default();

        match circuit.state {
            CircuitState::Closed => CircuitDecision::Allow,
            CircuitState::Open => {
                let elapsed_open =
                    circuit.opened_at.is_some_and(|at| at.elapsed() >= self.open_duration);
                if elapsed_open {
                    debug!(provider = %provider, "circuit transitioning to half-open");
                    circuit.state = CircuitState::HalfOpen;
                    circuit.probe_in_flight = true;
                    CircuitDecision::AllowProbe(ProbeGuard { manager: self, provider })
                } else {
                    CircuitDecision::Reject
                }
            },
            CircuitState::HalfOpen => {
                if circuit.probe_in_flight {
                    CircuitDecision::Reject
                } else {
                    circuit.probe_in_flight = true;
                    CircuitDecision::AllowProbe(ProbeGuard { manager: self, provider })
                }
            },
        }
    }

    pub fn record_success(&self, provider: ProviderId) {
        let mut circuits = self.circuits.write();
        let circuit = circuits.entry(provider).or_default();

        match circuit.state {
            CircuitState::Closed => {
                circuit.consecutive_failures = 0;
            },
            CircuitState::HalfOpen => {
                info!(provider = %provider, "circuit closing - provider recovered");
                *circuit = ProviderCircuit::default();
            },
            CircuitState::Open => {
                debug!(provider = %provider, "unexpected success in open state");
            },
        }
    }

    pub fn record_failure(&self, provider: ProviderId, kind: FailureKind) {
        let mut circuits = self.circuits.write();
        let circuit = circuits.entry(provider).or_default();

        circuit.consecutive_failures += 1;

        match circuit.state {
            CircuitState::Closed => {
                if circuit.consecutive_failures >= self.failure_threshold {
                    warn!(
                        provider = %provider,
                        failures = circuit.consecutive_failures,
                        kind = %kind,
                        "circuit opening - too many consecutive failures"
                    );
                    circuit.state = CircuitState::Open;
                    circuit.opened_at = Some(Instant::now());
                    self.total_trips.fetch_add(1, Ordering::Relaxed);
                }
            },
            CircuitState::HalfOpen => {
                warn!(
                    provider = %provider,
                    kind = %kind,
                    "circuit re-opening - trial call failed"
                );
                circuit.state = CircuitState::Open;
                circuit.opened_at = Some(Instant::now());
                circuit.probe_in_flight = false;
                self.total_trips.fetch_add(1, Ordering::Relaxed);
            },
            CircuitState::Open => {},
        }
    }

    pub fn state(&self, provider: ProviderId) -> CircuitState {
        let circuits = self.circuits.read();
        circuits.get(&provider).map_or(CircuitState::Closed, |c| c.state)
    }

    pub fn total_trips(&self) -> u64 {
        self.total_trips.load(Ordering::Relaxed)
    }
}
