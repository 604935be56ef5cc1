use super::*;
use switchboard_types::CredentialEntry;

fn provider_config(provider: ProviderId, secrets: &[&str]) -> ProviderConfig {
    ProviderConfig {
        provider,
        base_url: None,
        credentials: secrets
            .iter()
            .map(|s| CredentialEntry { secret: (*s).to_string(), label: None })
            .collect(),
    }
}

fn pool_with(secrets: &[&str]) -> CredentialPool {
    CredentialPool::new(
        &[provider_config(ProviderId::Gemini, secrets)],
        Duration::from_secs(60),
    )
}

#[test]
fn test_next_candidate_round_robin_covers_all() {
    let pool = pool_with(&["a", "b", "c"]);

    let mut seen = std::collections::HashSet::new();
    for _ in 0..3 {
        let cred = pool.next_candidate(ProviderId::Gemini).expect("candidate");
        seen.insert(cred.label().to_string());
    }
    assert_eq!(seen.len(), 3, "three consecutive selections must cover all three keys");
}

#[test]
fn test_next_candidate_unknown_provider() {
    let pool = pool_with(&["a"]);
    assert!(pool.next_candidate(ProviderId::Openrouter).is_none());
}

#[test]
fn test_rate_limited_credential_skipped_until_expiry() {
    let pool = pool_with(&["only"]);
    let cred = pool.next_candidate(ProviderId::Gemini).expect("candidate");

    let until = Instant::now() + Duration::from_millis(40);
    cred.mark_rate_limited(until);
    assert!(pool.next_candidate(ProviderId::Gemini).is_none());

    std::thread::sleep(Duration::from_millis(45));
    assert!(pool.next_candidate(ProviderId::Gemini).is_some());
}

#[test]
fn test_rate_limit_boundary_at_exactly_until() {
    let pool = pool_with(&["only"]);
    let cred = pool.next_candidate(ProviderId::Gemini).expect("candidate");

    let until = Instant::now() + Duration::from_secs(60);
    cred.mark_rate_limited(until);

    // Strictly before the boundary: ineligible
    assert!(!cred.is_eligible(until - Duration::from_millis(1)));
    // At exactly `until`: eligible again
    assert!(cred.is_eligible(until));
}

#[test]
fn test_auth_failure_disables_permanently() {
    let pool = pool_with(&["only"]);
    let cred = pool.next_candidate(ProviderId::Gemini).expect("candidate");

    pool.record_failure(&cred, FailureKind::AuthError, None);
    assert!(cred.is_disabled());
    assert!(pool.next_candidate(ProviderId::Gemini).is_none());
    assert!(!pool.has_usable_credentials(ProviderId::Gemini));

    // A later rate-limit signal must not resurrect a disabled credential
    cred.mark_rate_limited(Instant::now() + Duration::from_millis(1));
    std::thread::sleep(Duration::from_millis(5));
    assert!(cred.is_disabled());
}

#[test]
fn test_rate_limited_pool_still_counts_as_usable() {
    let pool = pool_with(&["only"]);
    let cred = pool.next_candidate(ProviderId::Gemini).expect("candidate");

    pool.record_failure(&cred, FailureKind::RateLimited, None);
    assert!(pool.next_candidate(ProviderId::Gemini).is_none());
    // Cooling down is temporary capacity loss, not provider death
    assert!(pool.has_usable_credentials(ProviderId::Gemini));
}

#[test]
fn test_retry_after_overrides_fixed_cooldown() {
    let pool = pool_with(&["only"]);
    let cred = pool.next_candidate(ProviderId::Gemini).expect("candidate");

    pool.record_failure(&cred, FailureKind::RateLimited, Some(Duration::from_millis(30)));
    assert!(pool.next_candidate(ProviderId::Gemini).is_none());

    // Far shorter than the 60s default
    std::thread::sleep(Duration::from_millis(35));
    assert!(pool.next_candidate(ProviderId::Gemini).is_some());
}

#[test]
fn test_transient_failure_keeps_credential_eligible() {
    let pool = pool_with(&["only"]);
    let cred = pool.next_candidate(ProviderId::Gemini).expect("candidate");

    pool.record_failure(&cred, FailureKind::Timeout, None);
    assert_eq!(cred.consecutive_errors(), 1);
    assert!(pool.next_candidate(ProviderId::Gemini).is_some());
}

#[test]
fn test_success_resets_consecutive_errors() {
    let pool = pool_with(&["only"]);
    let cred = pool.next_candidate(ProviderId::Gemini).expect("candidate");

    pool.record_failure(&cred, FailureKind::Timeout, None);
    pool.record_failure(&cred, FailureKind::Timeout, None);
    assert_eq!(cred.consecutive_errors(), 2);

    pool.record_success(&cred);
    assert_eq!(cred.consecutive_errors(), 0);
    assert_eq!(cred.total_errors(), 2);
    assert_eq!(cred.total_requests(), 3);
}

#[test]
fn test_default_labels_follow_config_order() {
    let pool = pool_with(&["a", "b"]);
    let mut labels: Vec<String> =
        pool.credential_usage().into_iter().map(|u| u.label).collect();
    labels.sort();
    assert_eq!(labels, vec!["gemini:key_1", "gemini:key_2"]);
}

#[test]
fn test_peek_secret_skips_disabled() {
    let pool = pool_with(&["a", "b"]);

    // Round-robin guarantees two consecutive selections differ
    let survivor = pool.next_candidate(ProviderId::Gemini).expect("candidate");
    let victim = pool.next_candidate(ProviderId::Gemini).expect("candidate");
    assert_ne!(survivor.label(), victim.label());

    pool.record_failure(&victim, FailureKind::AuthError, None);
    assert_eq!(pool.peek_secret(ProviderId::Gemini), Some(survivor.secret().to_string()));
}
