//! Read-through name lookup: caching, fuzzy matching and retry.

mod helpers;

use std::time::Duration;

use flowsmith::remote::{CachedLookup, NameLookup, RemoteError, ResourceKind};
use flowsmith::retry::RetryPolicy;
use helpers::MockDirectory;

#[tokio::test]
async fn exact_hit_is_cached() {
    let lookup = CachedLookup::new(
        MockDirectory::with_exact(&[("Placed Order", "MET-PO")]),
        RetryPolicy::no_retry(),
    );

    let first = lookup.lookup(ResourceKind::Metric, "Placed Order").await.unwrap();
    let second = lookup.lookup(ResourceKind::Metric, "Placed Order").await.unwrap();
    assert_eq!(first.as_deref(), Some("MET-PO"));
    assert_eq!(second, first);
    assert_eq!(lookup.directory().find_calls(), 1);
    assert_eq!(lookup.cached_len().await, 1);
}

#[tokio::test]
async fn falls_back_to_partial_match() {
    let lookup = CachedLookup::new(
        MockDirectory::with_listing(&[("Checkout Started (web)", "MET-CS"), ("Viewed Product", "MET-VP")]),
        RetryPolicy::no_retry(),
    );

    let id = lookup.lookup(ResourceKind::Metric, "checkout started").await.unwrap();
    assert_eq!(id.as_deref(), Some("MET-CS"));
    assert_eq!(lookup.directory().list_calls(), 1);
    assert_eq!(
        lookup.cached(ResourceKind::Metric, "checkout started").await.as_deref(),
        Some("MET-CS")
    );
}

#[tokio::test]
async fn misses_are_not_cached() {
    let lookup = CachedLookup::new(MockDirectory::default(), RetryPolicy::no_retry());

    assert_eq!(lookup.lookup(ResourceKind::List, "Ghost").await.unwrap(), None);
    assert_eq!(lookup.lookup(ResourceKind::List, "Ghost").await.unwrap(), None);
    assert_eq!(lookup.directory().find_calls(), 2);
    assert_eq!(lookup.cached_len().await, 0);
}

#[tokio::test]
async fn names_differing_only_in_case_are_cached_separately() {
    let lookup = CachedLookup::new(
        MockDirectory::with_exact(&[("placed order", "MET-A"), ("Placed Order", "MET-B")]),
        RetryPolicy::no_retry(),
    );

    let lower = lookup.lookup(ResourceKind::Metric, "placed order").await.unwrap();
    let title = lookup.lookup(ResourceKind::Metric, "Placed Order").await.unwrap();
    assert_eq!(lower.as_deref(), Some("MET-A"));
    assert_eq!(title.as_deref(), Some("MET-B"));
    assert_eq!(lookup.directory().find_calls(), 2);
    assert_eq!(lookup.cached_len().await, 2);
}

#[tokio::test]
async fn surrounding_whitespace_shares_a_cache_entry() {
    let lookup = CachedLookup::new(
        MockDirectory::with_exact(&[("Placed Order", "MET-PO")]),
        RetryPolicy::no_retry(),
    );

    lookup.lookup(ResourceKind::Metric, "Placed Order").await.unwrap();
    assert_eq!(
        lookup.cached(ResourceKind::Metric, "  Placed Order ").await.as_deref(),
        Some("MET-PO")
    );
}

#[tokio::test]
async fn kinds_are_cached_separately() {
    let lookup = CachedLookup::new(
        MockDirectory::with_exact(&[("VIP", "ID-1")]),
        RetryPolicy::no_retry(),
    );
    lookup.lookup(ResourceKind::Metric, "VIP").await.unwrap();
    assert_eq!(lookup.cached(ResourceKind::List, "VIP").await, None);
}

#[tokio::test(start_paused = true)]
async fn transient_directory_errors_are_retried() {
    let directory = MockDirectory::with_exact(&[("Placed Order", "MET-PO")]);
    directory.fail_next(vec![
        RemoteError::RateLimited("429".into()),
        RemoteError::Network("reset".into()),
    ]);
    let policy = RetryPolicy::new(3, Duration::from_millis(50), 2.0, Duration::from_secs(1))
        .with_retryable(["rate_limited", "network"]);
    let lookup = CachedLookup::new(directory, policy);

    let id = lookup.lookup(ResourceKind::Metric, "Placed Order").await.unwrap();
    assert_eq!(id.as_deref(), Some("MET-PO"));
    assert_eq!(lookup.directory().find_calls(), 3);
}

#[tokio::test]
async fn auth_failure_surfaces_without_retry() {
    let directory = MockDirectory::default();
    directory.fail_next(vec![RemoteError::Auth("401".into())]);
    let lookup = CachedLookup::new(directory, RetryPolicy::default());

    let err = lookup.lookup(ResourceKind::Metric, "Placed Order").await.unwrap_err();
    assert!(err.aborted);
    assert_eq!(lookup.directory().find_calls(), 1);
}
