use super::*;
use std::sync::atomic::AtomicU32;
use std::sync::Arc;
use std::time::Duration;

const PROVIDER: ProviderId = ProviderId::Gemini;

#[test]
fn test_circuit_opens_after_exactly_threshold_failures() {
    let manager = CircuitBreakerManager::with_settings(3, Duration::from_secs(60));

    assert!(!manager.check(PROVIDER).is_reject());
    assert_eq!(manager.state(PROVIDER), CircuitState::Closed);

    manager.record_failure(PROVIDER, FailureKind::Timeout);
    manager.record_failure(PROVIDER, FailureKind::Timeout);
    assert!(!manager.check(PROVIDER).is_reject());
    assert_eq!(manager.state(PROVIDER), CircuitState::Closed);

    manager.record_failure(PROVIDER, FailureKind::Timeout);
    assert!(manager.check(PROVIDER).is_reject());
    assert_eq!(manager.state(PROVIDER), CircuitState::Open);
    assert_eq!(manager.total_trips(), 1);
}

#[test]
fn test_success_resets_failure_count() {
    let manager = CircuitBreakerManager::with_settings(3, Duration::from_secs(60));

    manager.record_failure(PROVIDER, FailureKind::Timeout);
    manager.record_failure(PROVIDER, FailureKind::Timeout);
    manager.record_success(PROVIDER);

    manager.record_failure(PROVIDER, FailureKind::Timeout);
    manager.record_failure(PROVIDER, FailureKind::Timeout);
    assert_eq!(manager.state(PROVIDER), CircuitState::Closed);
}

#[test]
fn test_half_open_probe_success_closes_circuit() {
    let manager = CircuitBreakerManager::with_settings(2, Duration::from_millis(10));

    manager.record_failure(PROVIDER, FailureKind::ProviderUnavailable);
    manager.record_failure(PROVIDER, FailureKind::ProviderUnavailable);
    assert_eq!(manager.state(PROVIDER), CircuitState::Open);

    std::thread::sleep(Duration::from_millis(15));

    let decision = manager.check(PROVIDER);
    assert!(matches!(decision, CircuitDecision::AllowProbe(_)));
    assert_eq!(manager.state(PROVIDER), CircuitState::HalfOpen);

    // One successful trial closes the circuit
    manager.record_success(PROVIDER);
    drop(decision);
    assert_eq!(manager.state(PROVIDER), CircuitState::Closed);
}

#[test]
fn test_half_open_probe_failure_reopens_circuit() {
    let manager = CircuitBreakerManager::with_settings(2, Duration::from_millis(10));

    manager.record_failure(PROVIDER, FailureKind::ProviderUnavailable);
    manager.record_failure(PROVIDER, FailureKind::ProviderUnavailable);
    std::thread::sleep(Duration::from_millis(15));

    let decision = manager.check(PROVIDER);
    assert!(matches!(decision, CircuitDecision::AllowProbe(_)));

    manager.record_failure(PROVIDER, FailureKind::ProviderUnavailable);
    drop(decision);
    assert_eq!(manager.state(PROVIDER), CircuitState::Open);
    assert_eq!(manager.total_trips(), 2);

    // The fresh open window rejects immediately again
    assert!(manager.check(PROVIDER).is_reject());
}

#[test]
fn test_only_one_concurrent_probe_admitted() {
    let manager = CircuitBreakerManager::with_settings(1, Duration::from_millis(10));
    manager.record_failure(PROVIDER, FailureKind::ProviderUnavailable);
    assert_eq!(manager.state(PROVIDER), CircuitState::Open);

    std::thread::sleep(Duration::from_millis(15));

    let first = manager.check(PROVIDER);
    assert!(matches!(first, CircuitDecision::AllowProbe(_)));

    // Everyone else during the same window is rejected as if Open
    for _ in 0..10 {
        assert!(manager.check(PROVIDER).is_reject());
    }
    drop(first);
}

#[test]
fn test_abandoned_probe_releases_gate() {
    let manager = CircuitBreakerManager::with_settings(1, Duration::from_millis(10));
    manager.record_failure(PROVIDER, FailureKind::ProviderUnavailable);
    std::thread::sleep(Duration::from_millis(15));

    {
        let decision = manager.check(PROVIDER);
        assert!(matches!(decision, CircuitDecision::AllowProbe(_)));
        // Dropped without an outcome: caller was cancelled mid-probe
    }

    // The gate must be available to the next caller, not wedged
    assert!(matches!(manager.check(PROVIDER), CircuitDecision::AllowProbe(_)));
}

#[test]
fn test_fifty_parallel_callers_admit_exactly_one_probe() {
    let manager = Arc::new(CircuitBreakerManager::with_settings(1, Duration::from_millis(10)));
    manager.record_failure(PROVIDER, FailureKind::ProviderUnavailable);
    std::thread::sleep(Duration::from_millis(15));

    let admitted = Arc::new(AtomicU32::new(0));
    let barrier = Arc::new(std::sync::Barrier::new(50));
    let mut handles = Vec::new();
    for _ in 0..50 {
        let manager = Arc::clone(&manager);
        let admitted = Arc::clone(&admitted);
        let barrier = Arc::clone(&barrier);
        handles.push(std::thread::spawn(move || {
            // All threads hit the breaker in the same HalfOpen window
            barrier.wait();
            let decision = manager.check(PROVIDER);
            if let CircuitDecision::AllowProbe(_guard) = decision {
                admitted.fetch_add(1, Ordering::SeqCst);
                // Hold the gate long enough for every other thread to check
                std::thread::sleep(Duration::from_millis(100));
            }
        }));
    }
    for handle in handles {
        handle.join().expect("thread join");
    }

    assert_eq!(admitted.load(Ordering::SeqCst), 1);
}

#[test]
fn test_rate_limit_failures_do_not_trip_circuit() {
    // The orchestrator filters by should_trip_circuit; this documents the
    // classification contract the breaker relies on.
    assert!(!FailureKind::RateLimited.should_trip_circuit());
    assert!(!FailureKind::AuthError.should_trip_circuit());
    assert!(FailureKind::Timeout.should_trip_circuit());
    assert!(FailureKind::ProviderUnavailable.should_trip_circuit());
}
