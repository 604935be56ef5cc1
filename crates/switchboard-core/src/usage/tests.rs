use super::*;
use std::time::Duration;
use switchboard_types::{CredentialEntry, FailureKind, ProviderConfig};

fn two_provider_pool() -> CredentialPool {
    CredentialPool::new(
        &[
            ProviderConfig {
                provider: ProviderId::Gemini,
                base_url: None,
                credentials: vec![
                    CredentialEntry { secret: "g1".to_string(), label: None },
                    CredentialEntry { secret: "g2".to_string(), label: None },
                ],
            },
            ProviderConfig {
                provider: ProviderId::Openrouter,
                base_url: None,
                credentials: vec![CredentialEntry { secret: "o1".to_string(), label: None }],
            },
        ],
        Duration::from_secs(60),
    )
}

#[test]
fn test_counters_accumulate_per_provider() {
    let recorder = UsageRecorder::new();

    recorder.record_success(ProviderId::Gemini);
    recorder.record_success(ProviderId::Gemini);
    recorder.record_error(ProviderId::Gemini);
    recorder.record_success(ProviderId::Openrouter);

    let gemini = recorder.provider_usage(ProviderId::Gemini);
    assert_eq!(gemini.total_requests, 3);
    assert_eq!(gemini.success_count, 2);
    assert_eq!(gemini.error_count, 1);
    assert!(gemini.last_used.is_some());

    let openrouter = recorder.provider_usage(ProviderId::Openrouter);
    assert_eq!(openrouter.total_requests, 1);
    assert_eq!(openrouter.error_count, 0);
}

#[test]
fn test_untouched_provider_reports_zeroes() {
    let recorder = UsageRecorder::new();
    let usage = recorder.provider_usage(ProviderId::Gemini);
    assert_eq!(usage.total_requests, 0);
    assert!(usage.last_used.is_none());
}

#[test]
fn test_snapshot_composes_pool_and_provider_counters() {
    let recorder = UsageRecorder::new();
    let pool = two_provider_pool();

    let cred = pool.next_candidate(ProviderId::Gemini).expect("candidate");
    pool.record_success(&cred);
    recorder.record_success(ProviderId::Gemini);

    let cred = pool.next_candidate(ProviderId::Gemini).expect("candidate");
    pool.record_failure(&cred, FailureKind::Timeout, None);
    recorder.record_error(ProviderId::Gemini);

    let snapshot = recorder.snapshot(&pool);
    assert_eq!(snapshot.providers.len(), 2);
    assert_eq!(snapshot.credentials.len(), 3);

    let gemini = snapshot
        .providers
        .iter()
        .find(|p| p.provider == ProviderId::Gemini)
        .expect("gemini entry");
    assert_eq!(gemini.total_requests, 2);
    assert_eq!(gemini.success_count, 1);

    // Credential counters come straight from the pool, not a second copy
    let total_cred_requests: u64 =
        snapshot.credentials.iter().map(|c| c.total_requests).sum();
    assert_eq!(total_cred_requests, 2);
}
