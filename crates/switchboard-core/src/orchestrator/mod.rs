//! The orchestrator façade.
//!
//! The only component callers interact with. Drives credential selection,
//! invocation, retry, circuit-breaker checks, and provider fallback for one
//! logical request, and returns a normalized result or a typed failure.
//!
//! No lock is held across a transport call; the only blocking points are the
//! call itself and the backoff sleep, both cancelled by the caller's
//! deadline.


use chrono::Utc;
use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use switchboard_types::{
    AiRequest, Completion, ConfigError, FailureKind, HealthReport, HealthStatus,
    OrchestratorConfig, OrchestratorError, ProviderAttempt, ProviderHealth, ProviderId,
};

use crate::circuit_breaker::{CircuitBreakerManager, CircuitDecision, CircuitState};
use crate::credentials::CredentialPool;
use crate::health::HealthProbe;
use crate::retry::RetryPolicy;
use crate::transport::{HttpTransport, ProviderTransport};
use crate::usage::UsageRecorder;

/// Cap on the background probe's per-request timeout; probes are cheap and
/// must not tie up the prober for a full request window.
const PROBE_TIMEOUT_CAP: Duration = Duration::from_secs(10);

/// Multi-provider AI request orchestrator.
///
/// One instance is shared by all in-flight application requests; every field
/// is designed for concurrent access.
pub struct Orchestrator {
    pool: Arc<CredentialPool>,
    breaker: CircuitBreakerManager,
    retry: RetryPolicy,
    usage: UsageRecorder,
    transports: HashMap<ProviderId, Arc<dyn ProviderTransport>>,
    request_timeout: Duration,
    probe: Arc<HealthProbe>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("providers", &self.transports.keys().collect::<Vec<_>>())
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Build an orchestrator with the built-in HTTP transports.
    pub fn from_config(config: OrchestratorConfig) -> Result<Self, OrchestratorError> {
        config.validate().map_err(OrchestratorError::Config)?;

        let transports: HashMap<ProviderId, Arc<dyn ProviderTransport>> = config
            .providers
            .iter()
            .map(|p| {
                let transport: Arc<dyn ProviderTransport> =
                    Arc::new(HttpTransport::for_provider(p.provider, p.base_url.clone()));
                (p.provider, transport)
            })
            .collect();

        Self::with_transports(config, transports)
    }

    /// Build an orchestrator with caller-supplied transports (tests, custom
    /// protocols).
    pub fn with_transports(
        config: OrchestratorConfig,
        transports: HashMap<ProviderId, Arc<dyn ProviderTransport>>,
    ) -> Result<Self, OrchestratorError> {
        config.validate().map_err(OrchestratorError::Config)?;

        for provider_config in &config.providers {
            if !transports.contains_key(&provider_config.provider) {
                return Err(OrchestratorError::Config(ConfigError::Invalid {
                    message: format!("no transport for provider {}", provider_config.provider),
                }));
            }
        }

        let request_timeout = Duration::from_secs(config.request_timeout_secs);
        let pool = Arc::new(CredentialPool::new(
            &config.providers,
            Duration::from_secs(config.rate_limit_cooldown_secs),
        ));
        let probe = HealthProbe::new(
            transports.clone(),
            Arc::clone(&pool),
            Duration::from_secs(config.health_probe_interval_secs),
            request_timeout.min(PROBE_TIMEOUT_CAP),
        );

        Ok(Self {
            pool,
            breaker: CircuitBreakerManager::new(config.breaker),
            retry: RetryPolicy::from(config.retry),
            usage: UsageRecorder::new(),
            transports,
            request_timeout,
            probe,
        })
    }

    /// Execute one logical request.
    ///
    /// Tries the preferred provider first (unless its circuit is open), then
    /// the remaining providers in randomized order. Returns the first
    /// successful response, or `Exhausted` describing the last failure per
    /// provider attempted.
    pub async fn execute(
        &self,
        request: &AiRequest,
        preferred: Option<ProviderId>,
    ) -> Result<Completion, OrchestratorError> {
        let trace = uuid::Uuid::new_v4().simple().to_string();
        let trace_id = &trace[..8];

        let order = self.trial_order(preferred);
        let mut attempted: Vec<ProviderAttempt> = Vec::with_capacity(order.len());
        let mut total_attempts: u32 = 0;

        for provider in order {
            match self.try_provider(trace_id, provider, request, &mut total_attempts).await {
                Ok(completion) => {
                    info!(
                        trace = %trace_id,
                        provider = %completion.provider,
                        credential = %completion.credential,
                        attempts = completion.attempts,
                        "request served"
                    );
                    return Ok(completion);
                },
                Err(attempt) => {
                    debug!(
                        trace = %trace_id,
                        provider = %attempt.provider,
                        attempts = attempt.attempts,
                        last_failure = %attempt.last_failure,
                        "provider exhausted, moving on"
                    );
                    attempted.push(attempt);
                },
            }
        }

        warn!(
            trace = %trace_id,
            providers_tried = attempted.len(),
            "all providers exhausted"
        );
        Err(OrchestratorError::Exhausted { attempts: attempted })
    }

    /// Execute with an overall deadline covering retries and fallback.
    ///
    /// Expiry cancels the in-flight transport call and yields a `Timeout`
    /// outcome without consuming further attempts.
    pub async fn execute_with_deadline(
        &self,
        request: &AiRequest,
        preferred: Option<ProviderId>,
        deadline: Duration,
    ) -> Result<Completion, OrchestratorError> {
        let started = Instant::now();
        match tokio::time::timeout(deadline, self.execute(request, preferred)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(deadline_ms = deadline.as_millis() as u64, "caller deadline expired");
                Err(OrchestratorError::Timeout {
                    elapsed_ms: started.elapsed().as_millis() as u64,
                })
            },
        }
    }

    /// Provider trial order: preferred first when usable, otherwise all
    /// configured providers shuffled so no provider is systematically
    /// starved when callers express no preference.
    fn trial_order(&self, preferred: Option<ProviderId>) -> Vec<ProviderId> {
        let mut order = self.pool.provider_ids();
        order.shuffle(&mut rand::thread_rng());

        if let Some(provider) = preferred {
            if order.contains(&provider) && self.breaker.state(provider) != CircuitState::Open {
                order.retain(|p| *p != provider);
                order.insert(0, provider);
            }
        }

        order
    }

    /// Drive one provider until success, attempt exhaustion, or pool
    /// exhaustion. Returns the attempt summary on failure.
    async fn try_provider(
        &self,
        trace_id: &str,
        provider: ProviderId,
        request: &AiRequest,
        total_attempts: &mut u32,
    ) -> Result<Completion, ProviderAttempt> {
        let unavailable = |attempts: u32, last_failure: FailureKind| ProviderAttempt {
            provider,
            attempts,
            last_failure,
        };

        // A provider with zero non-disabled credentials is unusable no
        // matter what the breaker says
        if !self.pool.has_usable_credentials(provider) {
            debug!(trace = %trace_id, provider = %provider, "no usable credentials");
            return Err(unavailable(0, FailureKind::ProviderUnavailable));
        }

        let Some(transport) = self.transports.get(&provider) else {
            return Err(unavailable(0, FailureKind::ProviderUnavailable));
        };

        let mut probe_guard = match self.breaker.check(provider) {
            CircuitDecision::Reject => {
                debug!(trace = %trace_id, provider = %provider, "circuit open, skipping");
                return Err(unavailable(0, FailureKind::ProviderUnavailable));
            },
            CircuitDecision::Allow => None,
            CircuitDecision::AllowProbe(guard) => {
                debug!(trace = %trace_id, provider = %provider, "half-open trial call");
                Some(guard)
            },
        };

        // A half-open circuit admits exactly one trial invocation
        let max_attempts =
            if probe_guard.is_some() { 1 } else { self.retry.max_attempts() };

        let mut attempts_here: u32 = 0;
        let mut last_failure = FailureKind::ProviderUnavailable;
        let mut attempt: u32 = 0;

        while attempt < max_attempts {
            // Pool exhaustion is a capacity problem, not a provider failure:
            // no breaker failure is recorded for it
            let Some(credential) = self.pool.next_candidate(provider) else {
                break;
            };

            attempts_here += 1;
            *total_attempts += 1;
            debug!(
                trace = %trace_id,
                provider = %provider,
                credential = %credential.label(),
                attempt = attempt + 1,
                "invoking provider"
            );

            match transport.send(credential.secret(), request, self.request_timeout).await {
                Ok(response) => {
                    self.pool.record_success(&credential);
                    self.breaker.record_success(provider);
                    self.usage.record_success(provider);
                    return Ok(Completion {
                        payload: response.payload,
                        provider,
                        credential: credential.label().to_string(),
                        attempts: *total_attempts,
                    });
                },
                Err(err) => {
                    let kind = err.kind();
                    self.pool.record_failure(&credential, kind, err.retry_after());
                    if kind.should_trip_circuit() {
                        self.breaker.record_failure(provider, kind);
                    }
                    self.usage.record_error(provider);
                    last_failure = kind;

                    warn!(
                        trace = %trace_id,
                        provider = %provider,
                        credential = %credential.label(),
                        kind = %kind,
                        attempt = attempt + 1,
                        "invocation failed"
                    );

                    if probe_guard.take().is_some() {
                        // Trial failed; the breaker has re-opened
                        break;
                    }

                    attempt += 1;

                    if kind.should_rotate_credential() {
                        // Rate limits and auth rejections move to the next
                        // credential immediately, with no backoff sleep
                        continue;
                    }

                    if kind.is_retryable() {
                        match self.retry.delay_for(attempt - 1) {
                            Some(delay) => {
                                debug!(
                                    trace = %trace_id,
                                    provider = %provider,
                                    delay_ms = delay.as_millis() as u64,
                                    "backing off before retry"
                                );
                                sleep(delay).await;
                                continue;
                            },
                            None => break,
                        }
                    }

                    break;
                },
            }
        }

        Err(ProviderAttempt { provider, attempts: attempts_here, last_failure })
    }

    /// Aggregated, point-in-time usage counters.
    pub fn stats(&self) -> switchboard_types::UsageSnapshot {
        self.usage.snapshot(&self.pool)
    }

    /// Operational health per provider, combining breaker state, pool
    /// capacity, and the latest background probe.
    pub fn health_check(&self) -> HealthReport {
        let providers = self
            .pool
            .provider_ids()
            .into_iter()
            .map(|provider| {
                let (status, probed_at) = self.provider_health(provider);
                ProviderHealth { provider, status, probed_at }
            })
            .collect();

        HealthReport { generated_at: Utc::now(), providers }
    }

    fn provider_health(&self, provider: ProviderId) -> (HealthStatus, Option<chrono::DateTime<Utc>>) {
        let probed = self.probe.last_probe(provider);
        let probed_at = probed.map(|(_, at)| at);

        if !self.pool.has_usable_credentials(provider) {
            return (HealthStatus::Down, probed_at);
        }

        let breaker_status = match self.breaker.state(provider) {
            CircuitState::Open => return (HealthStatus::Down, probed_at),
            CircuitState::HalfOpen => HealthStatus::Degraded,
            CircuitState::Closed => HealthStatus::Ok,
        };

        let (eligible, total) = self.pool.eligibility(provider);
        let pool_status = if eligible == 0 {
            HealthStatus::Down
        } else if eligible < total {
            HealthStatus::Degraded
        } else {
            HealthStatus::Ok
        };

        let probe_status = probed.map_or(HealthStatus::Ok, |(status, _)| status);

        (worst(breaker_status, worst(pool_status, probe_status)), probed_at)
    }

    /// Start the background health probe task.
    pub fn start_health_probe(&self) -> tokio::task::JoinHandle<()> {
        self.probe.start()
    }

    /// Stop the background health probe task.
    pub fn stop_health_probe(&self) {
        self.probe.shutdown()
    }
}

fn worst(a: HealthStatus, b: HealthStatus) -> HealthStatus {
    fn rank(status: HealthStatus) -> u8 {
        match status {
            HealthStatus::Ok => 0,
            HealthStatus::Degraded => 1,
            HealthStatus::Down => 2,
        }
    }
    if rank(a) >= rank(b) {
        a
    } else {
        b
    }
}
