//! Circuit breaker state types.

use std::time::Instant;

/// State of a provider's circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation - requests pass through
    Closed,
    /// Provider is failing - requests fail immediately
    Open,
    /// Testing recovery - a single trial call is allowed
    HalfOpen,
}

/// Per-provider circuit breaker state.
#[derive(Debug)]
pub(crate) struct ProviderCircuit {
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub opened_at: Option<Instant>,
    /// Single-acquire gate: set while the HalfOpen trial call is in flight
    pub probe_in_flight: bool,
}

impl Default for ProviderCircuit {
    fn default() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            opened_at: None,
            probe_in_flight: false,
        }
    }
}
