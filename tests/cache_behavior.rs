//! Behavior-driven tests for same-day caching across dispatchers and runs.

use std::sync::Arc;

use coretrack_core::{CacheStore, Dispatcher, FetchContext, TrackSpec};
use coretrack_tests::{adapters, day, holding, ScriptedFlow};

fn dispatcher_on(
    cache: Arc<CacheStore>,
    flow: Arc<ScriptedFlow>,
    today: &str,
) -> Dispatcher {
    let mut set = adapters();
    set.flow = flow;
    Dispatcher::new(Arc::new(FetchContext::new(set, cache, day(today))))
}

#[tokio::test]
async fn same_day_second_dispatch_skips_the_adapter() {
    // Given: one successful fetch already cached
    let dir = tempfile::tempdir().expect("tempdir");
    let cache = Arc::new(CacheStore::open(dir.path().join("indicator_cache.json")));
    let flow = Arc::new(ScriptedFlow::ok(12.34, -6.7));
    let dispatcher = dispatcher_on(cache, flow.clone(), "2026-08-07");
    let etf = holding("513180", "恒生科技ETF", TrackSpec::SouthboundFlow);

    let first = dispatcher.dispatch(&etf).await;

    // When: the same holding dispatches again on the same day
    let second = dispatcher.dispatch(&etf).await;

    // Then: the cached text comes back without another adapter call
    assert_eq!(first, second);
    assert_eq!(flow.calls(), 1);
}

#[tokio::test]
async fn a_later_run_on_the_same_day_reuses_the_file() {
    // Given: a run that cached successfully, then a fresh process whose
    // upstream is now dead
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("indicator_cache.json");
    let etf = holding("513180", "恒生科技ETF", TrackSpec::SouthboundFlow);

    let first_run = dispatcher_on(
        Arc::new(CacheStore::open(&path)),
        Arc::new(ScriptedFlow::ok(12.34, -6.7)),
        "2026-08-07",
    );
    let first = first_run.dispatch(&etf).await;
    assert!(!first.is_fallback());

    let second_run = dispatcher_on(
        Arc::new(CacheStore::open(&path)),
        Arc::new(ScriptedFlow::failing("upstream gone")),
        "2026-08-07",
    );

    // When / Then: the second process serves the same line from the file
    let second = second_run.dispatch(&etf).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn day_roll_invalidates_yesterdays_entry() {
    // Given: a cached line from the previous day
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("indicator_cache.json");
    let etf = holding("513180", "恒生科技ETF", TrackSpec::SouthboundFlow);

    let yesterday_run = dispatcher_on(
        Arc::new(CacheStore::open(&path)),
        Arc::new(ScriptedFlow::ok(12.34, -6.7)),
        "2026-08-06",
    );
    assert!(!yesterday_run.dispatch(&etf).await.is_fallback());

    // When: the next day's run finds its upstream dead
    let today_run = dispatcher_on(
        Arc::new(CacheStore::open(&path)),
        Arc::new(ScriptedFlow::failing("upstream gone")),
        "2026-08-07",
    );
    let today = today_run.dispatch(&etf).await;

    // Then: the stale entry is not served; the holding falls back
    assert!(today.is_fallback());
}

#[tokio::test]
async fn manual_cache_deletion_just_refetches() {
    // Given: a cached run, then the operator deletes the file
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("indicator_cache.json");
    let flow = Arc::new(ScriptedFlow::ok(12.34, -6.7));
    let dispatcher = dispatcher_on(Arc::new(CacheStore::open(&path)), flow.clone(), "2026-08-07");
    let etf = holding("513180", "恒生科技ETF", TrackSpec::SouthboundFlow);

    assert!(!dispatcher.dispatch(&etf).await.is_fallback());
    std::fs::remove_file(&path).expect("cache file exists");

    // When / Then: the next dispatch fetches again instead of failing
    assert!(!dispatcher.dispatch(&etf).await.is_fallback());
    assert_eq!(flow.calls(), 2);
}

#[tokio::test]
async fn garbage_cache_file_never_breaks_a_run() {
    // Given: a hand-corrupted cache file
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("indicator_cache.json");
    std::fs::write(&path, "{{{ not json").expect("seed garbage");

    let flow = Arc::new(ScriptedFlow::ok(12.34, -6.7));
    let dispatcher = dispatcher_on(Arc::new(CacheStore::open(&path)), flow, "2026-08-07");

    // When / Then: the run proceeds as if the cache were empty
    let result = dispatcher
        .dispatch(&holding("513180", "恒生科技ETF", TrackSpec::SouthboundFlow))
        .await;
    assert!(!result.is_fallback());
}
