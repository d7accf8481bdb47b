//! Retry layer timing and classification, on a paused clock.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use flowsmith::remote::RemoteError;
use flowsmith::retry::{RetryPolicy, with_retry};
use tokio::time::Instant;

fn policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new(
        max_attempts,
        Duration::from_millis(100),
        2.0,
        Duration::from_millis(300),
    )
}

#[tokio::test(start_paused = true)]
async fn always_failing_uses_every_attempt_and_full_schedule() {
    let calls = &AtomicU32::new(0);
    let start = Instant::now();
    let policy = policy(4);

    let result: Result<(), _> = with_retry(
        move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(RemoteError::Network("connection reset".into()))
        },
        "create flow",
        &policy,
    )
    .await;

    let err = result.unwrap_err();
    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert_eq!(err.attempts, 4);
    assert!(!err.aborted);
    // 100 + 200 + 300 (capped)
    assert_eq!(start.elapsed(), Duration::from_millis(600));
    let message = err.to_string();
    assert!(message.contains("create flow"), "{message}");
    assert!(message.contains("connection reset"), "{message}");
}

#[tokio::test(start_paused = true)]
async fn succeeds_after_transient_failures() {
    let calls = &AtomicU32::new(0);
    let start = Instant::now();

    let value = with_retry(
        move || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n < 3 {
                Err(RemoteError::RateLimited("429".into()))
            } else {
                Ok(n)
            }
        },
        "lookup",
        &policy(5),
    )
    .await
    .unwrap();

    assert_eq!(value, 3);
    assert_eq!(start.elapsed(), Duration::from_millis(300));
}

#[tokio::test(start_paused = true)]
async fn non_retryable_error_fails_fast() {
    let calls = &AtomicU32::new(0);
    let start = Instant::now();
    let policy = policy(5).with_retryable(["rate_limited", "network"]);

    let err = with_retry(
        move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(RemoteError::Auth("401 unauthorized".into()))
        },
        "create flow",
        &policy,
    )
    .await
    .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(err.aborted);
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(err.into_inner(), RemoteError::Auth("401 unauthorized".into()));
}

#[tokio::test(start_paused = true)]
async fn message_patterns_match_plain_errors() {
    let calls = &AtomicU32::new(0);
    let policy = policy(3).with_retryable(["timeout"]);

    let err = with_retry(
        move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>("upstream Timeout after 30s".to_string())
        },
        "render",
        &policy,
    )
    .await
    .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(err.attempts, 3);
}

#[tokio::test(start_paused = true)]
async fn default_policy_does_not_retry_auth() {
    let calls = &AtomicU32::new(0);
    let _ = with_retry(
        move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(RemoteError::Auth("403".into()))
        },
        "read",
        &RetryPolicy::default(),
    )
    .await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn zero_attempts_still_tries_once() {
    let calls = &AtomicU32::new(0);
    let _ = with_retry(
        move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(RemoteError::Network("down".into()))
        },
        "x",
        &policy(0),
    )
    .await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
