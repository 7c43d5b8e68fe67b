//! Behavior-driven tests for dispatch and orchestration policy.
//!
//! These tests verify HOW the system isolates failures: no indicator
//! problem of any kind may leak past the dispatcher, and the assembled
//! report must always cover every configured holding in configured order.

use std::sync::Arc;
use std::time::Duration;

use coretrack_core::{Dispatcher, Orchestrator, TrackSpec};
use coretrack_tests::{adapters, context, holding, ScriptedAnnouncements, ScriptedFlow};

#[tokio::test]
async fn when_tracking_is_none_no_adapter_is_ever_consulted() {
    // Given: a holding explicitly configured for static text only
    let dir = tempfile::tempdir().expect("tempdir");
    let flow = Arc::new(ScriptedFlow::ok(1.0, 2.0));
    let announcements = Arc::new(ScriptedAnnouncements::empty());

    let mut set = adapters();
    set.flow = flow.clone();
    set.announcements = announcements.clone();
    let dispatcher = Dispatcher::new(Arc::new(context(&dir, set, "2026-08-07")));

    // When: the holding is dispatched
    let result = dispatcher
        .dispatch(&holding("600036", "招商银行", TrackSpec::None))
        .await;

    // Then: the fallback sentinel comes back without a single upstream call
    assert!(result.is_fallback());
    assert_eq!(flow.calls(), 0);
    assert_eq!(announcements.calls(), 0);
}

#[tokio::test]
async fn when_the_source_times_out_the_holding_falls_back() {
    // Given: a flow source that answers far beyond the dispatch budget
    let dir = tempfile::tempdir().expect("tempdir");
    let mut set = adapters();
    set.flow = Arc::new(ScriptedFlow::ok(1.0, 2.0).with_delay(Duration::from_secs(30)));
    let dispatcher = Dispatcher::new(Arc::new(context(&dir, set, "2026-08-07")))
        .with_budget(Duration::from_millis(50));

    // When: the holding is dispatched
    let result = dispatcher
        .dispatch(&holding("513180", "恒生科技ETF", TrackSpec::SouthboundFlow))
        .await;

    // Then: the timeout converts to fallback instead of propagating
    assert!(result.is_fallback());
}

#[tokio::test]
async fn when_the_source_errors_the_holding_falls_back() {
    // Given: a simulated upstream outage
    let dir = tempfile::tempdir().expect("tempdir");
    let mut set = adapters();
    set.flow = Arc::new(ScriptedFlow::failing("connection refused"));
    let dispatcher = Dispatcher::new(Arc::new(context(&dir, set, "2026-08-07")));

    // When / Then: dispatch yields fallback, nothing raises
    let result = dispatcher
        .dispatch(&holding("513180", "恒生科技ETF", TrackSpec::SouthboundFlow))
        .await;
    assert!(result.is_fallback());
}

#[tokio::test]
async fn one_broken_source_never_touches_other_holdings() {
    // Given: a portfolio where only the announcement source is dead
    let dir = tempfile::tempdir().expect("tempdir");
    let mut set = adapters();
    set.flow = Arc::new(ScriptedFlow::ok(12.34, -6.7));
    // No bulletins at all: the monthly-sales holding cannot render.
    set.announcements = Arc::new(ScriptedAnnouncements::empty());

    let dispatcher = Arc::new(Dispatcher::new(Arc::new(context(&dir, set, "2026-08-07"))));
    let holdings = vec![
        holding("513180", "恒生科技ETF", TrackSpec::SouthboundFlow),
        holding(
            "601127",
            "赛力斯",
            TrackSpec::MonthlySales {
                keyword: String::from("产销快报"),
            },
        ),
        holding("600036", "招商银行", TrackSpec::None),
    ];

    // When: the whole portfolio runs
    let results = Orchestrator::new(dispatcher).run(&holdings).await;

    // Then: every holding has a slot and only the broken one degraded
    assert_eq!(results.len(), 3);
    assert_eq!(
        results[0].result.rendered_text(),
        Some("南向资金: 昨日净流入+12.3亿 | 近5日累计-6.7亿")
    );
    assert!(results[1].result.is_fallback());
    assert_eq!(results[1].display_line(), "赛力斯的静态描述");
    assert!(results[2].result.is_fallback());
}

#[tokio::test]
async fn concurrent_completion_order_never_reorders_the_report() {
    // Given: a shared flow source slow enough that later holdings finish
    // first under a wide-open pool
    let dir = tempfile::tempdir().expect("tempdir");
    let mut set = adapters();
    set.flow = Arc::new(ScriptedFlow::ok(1.0, 2.0).with_delay(Duration::from_millis(30)));
    let dispatcher = Arc::new(Dispatcher::new(Arc::new(context(&dir, set, "2026-08-07"))));

    let holdings = vec![
        holding("513180", "恒生科技ETF", TrackSpec::SouthboundFlow),
        holding("600036", "招商银行", TrackSpec::None),
        holding("159869", "游戏ETF", TrackSpec::SouthboundFlow),
        holding("601127", "赛力斯", TrackSpec::None),
    ];

    // When: dispatched with maximum concurrency (None holdings return
    // instantly, flow holdings sleep first)
    let results = Orchestrator::new(dispatcher)
        .with_concurrency(4)
        .run(&holdings)
        .await;

    // Then: output order is exactly the configured order
    let codes: Vec<&str> = results.iter().map(|r| r.code.as_str()).collect();
    assert_eq!(codes, vec!["513180", "600036", "159869", "601127"]);
}
