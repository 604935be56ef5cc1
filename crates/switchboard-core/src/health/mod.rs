//! Background provider health probing.
//!
//! Periodic, low-cost call per provider used to populate the operational
//! health surface. Read-only with respect to the credential pool and the
//! circuit breakers: probe outcomes are recorded here and nowhere else.


use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use switchboard_types::{HealthStatus, ProviderId};

use crate::credentials::CredentialPool;
use crate::transport::ProviderTransport;

#[derive(Debug, Clone, Copy)]
struct ProbeOutcome {
    status: HealthStatus,
    at_ms: i64,
}

/// Periodically probes each provider with a cheap request.
pub struct HealthProbe {
    transports: HashMap<ProviderId, Arc<dyn ProviderTransport>>,
    pool: Arc<CredentialPool>,
    interval: Duration,
    probe_timeout: Duration,
    results: DashMap<ProviderId, ProbeOutcome>,
    shutdown_tx: tokio::sync::watch::Sender<bool>,
}

impl HealthProbe {
    pub fn new(
        transports: HashMap<ProviderId, Arc<dyn ProviderTransport>>,
        pool: Arc<CredentialPool>,
        interval: Duration,
        probe_timeout: Duration,
    ) -> Arc<Self> {
        let (shutdown_tx, _) = tokio::sync::watch::channel(false);
        Arc::new(Self {
            transports,
            pool,
            interval,
            probe_timeout,
            results: DashMap::new(),
            shutdown_tx,
        })
    }

    /// Start the background probing task.
    pub fn start(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let probe = Arc::clone(self);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = tokio::time::sleep(probe.interval) => {
                        probe.probe_now().await;
                    }
                    _ = shutdown_rx.changed() => {
                        info!("health probe task shutting down");
                        break;
                    }
                }
            }
        })
    }

    /// Signal the background task to stop.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Probe every configured provider once.
    pub async fn probe_now(&self) {
        for provider in self.pool.provider_ids() {
            let status = self.probe_provider(provider).await;
            debug!(provider = %provider, status = %status, "health probe completed");
            self.results
                .insert(provider, ProbeOutcome { status, at_ms: Utc::now().timestamp_millis() });
        }
    }

    async fn probe_provider(&self, provider: ProviderId) -> HealthStatus {
        let Some(transport) = self.transports.get(&provider) else {
            return HealthStatus::Down;
        };
        // Read-only peek: probing must not advance rotation or mutate state
        let Some(secret) = self.pool.peek_secret(provider) else {
            warn!(provider = %provider, "no usable credential to probe with");
            return HealthStatus::Down;
        };

        match transport.probe(&secret, self.probe_timeout).await {
            Ok(()) => HealthStatus::Ok,
            Err(err) => {
                let status = match err.kind() {
                    // Reachable but impaired
                    switchboard_types::FailureKind::RateLimited
                    | switchboard_types::FailureKind::AuthError => HealthStatus::Degraded,
                    switchboard_types::FailureKind::Timeout
                    | switchboard_types::FailureKind::ProviderUnavailable => HealthStatus::Down,
                };
                warn!(provider = %provider, error = %err, status = %status, "health probe failed");
                status
            },
        }
    }

    /// Latest probe verdict, if any probe has run.
    pub fn last_probe(&self, provider: ProviderId) -> Option<(HealthStatus, DateTime<Utc>)> {
        self.results.get(&provider).and_then(|outcome| {
            DateTime::from_timestamp_millis(outcome.at_ms).map(|at| (outcome.status, at))
        })
    }
}
