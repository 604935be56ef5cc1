use super::*;

fn policy(max_attempts: u32, jitter: bool) -> RetryPolicy {
    RetryPolicy::new(max_attempts, Duration::from_millis(100), Duration::from_millis(800), jitter)
}

#[test]
fn test_exponential_schedule_without_jitter() {
    let policy = policy(5, false);

    assert_eq!(policy.delay_for(0), Some(Duration::from_millis(100)));
    assert_eq!(policy.delay_for(1), Some(Duration::from_millis(200)));
    assert_eq!(policy.delay_for(2), Some(Duration::from_millis(400)));
    // Capped at max_delay
    assert_eq!(policy.delay_for(3), Some(Duration::from_millis(800)));
}

#[test]
fn test_stops_after_max_attempts() {
    let policy = policy(3, false);

    assert!(policy.delay_for(0).is_some());
    assert!(policy.delay_for(1).is_some());
    // Attempt 2 is the third and final invocation; no further retry
    assert_eq!(policy.delay_for(2), None);
}

#[test]
fn test_single_attempt_never_retries() {
    let policy = policy(1, false);
    assert_eq!(policy.delay_for(0), None);
}

#[test]
fn test_jitter_stays_within_schedule() {
    let policy = policy(5, true);

    for _ in 0..100 {
        let delay = policy.delay_for(2).expect("retry allowed");
        assert!(delay <= Duration::from_millis(400), "jittered delay exceeded schedule: {delay:?}");
    }
}

#[test]
fn test_large_attempt_index_does_not_overflow() {
    let policy = RetryPolicy::new(
        u32::MAX,
        Duration::from_millis(100),
        Duration::from_millis(800),
        false,
    );
    assert_eq!(policy.delay_for(63), Some(Duration::from_millis(800)));
}
