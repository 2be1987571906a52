//! Integration tests for the verification pipeline
//!
//! These tests drive head resolution, chain walks, analysis, aggregation and
//! webhook delivery together against an in-memory store.

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use dag_core::{HeadRecord, IntegrityAnalyzer, IssueType, NotifyRequest, RetryDecision};
use dag_verifier::{
    cancel_pair, deliver, CancelSignal, ChainWalker, HeadTracker, MemoryStore,
    NotificationDispatcher, NotifyError, RateLimit, RateLimitedFetcher, RetryPolicy,
    RetryStrategy, StaticHeadSource, TrackedHead, VerificationRunner,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn now() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

/// Store a chain whose nodes link in the given order, returning the head CID
async fn put_chain(store: &MemoryStore, project: &str, heights: &[i64]) -> String {
    let mut prev = String::new();
    for height in heights {
        let cid = format!("{}-{}", project, height);
        store
            .put_json(
                &cid,
                &json!({
                    "data": { "cid": format!("snap-{}-{}", project, height), "type": "HOT_IPFS" },
                    "height": height,
                    "prevCid": if prev.is_empty() { json!(null) } else { json!({ "/": prev }) },
                    "timestamp": 1_700_000_000 + height,
                }),
            )
            .await
            .unwrap();
        prev = cid;
    }
    prev
}

fn create_runner(
    store: &MemoryStore,
    heads: StaticHeadSource,
    tracker: HeadTracker,
    limit: RateLimit,
) -> VerificationRunner {
    let fetcher = RateLimitedFetcher::new(Arc::new(store.clone()), limit, Duration::from_secs(30));
    VerificationRunner::new(
        ChainWalker::new(fetcher),
        Arc::new(heads),
        IntegrityAnalyzer::default(),
    )
    .with_tracker(tracker)
    .with_worker_count(4)
}

fn ids(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

/// Clean project `a`, gapped project `b`, stuck project `c`
async fn three_projects(store: &MemoryStore, tracker: &HeadTracker) -> StaticHeadSource {
    let a = put_chain(store, "a", &[1, 2, 3]).await;
    let b = put_chain(store, "b", &[5, 7]).await;
    let c = put_chain(store, "c", &[1, 2]).await;

    tracker
        .seed(
            "c",
            TrackedHead {
                head: HeadRecord::new(2, now() - ChronoDuration::hours(2)),
                verified_height: Some(2),
            },
        )
        .await;

    StaticHeadSource::new()
        .with_head("a", &a)
        .with_head("b", &b)
        .with_head("c", &c)
}

// ============ Verification Pass Tests ============

#[tokio::test]
async fn test_pass_summarizes_gap_and_stuck_projects() {
    let store = MemoryStore::new();
    let tracker = HeadTracker::new();
    let heads = three_projects(&store, &tracker).await;
    let runner = create_runner(&store, heads, tracker, RateLimit::Unlimited);

    let report = runner
        .run_at(&ids(&["a", "b", "c"]), CancelSignal::never(), now())
        .await;

    let summary = &report.summary;
    assert_eq!(summary.projects_tracked_count, 3);
    assert_eq!(summary.projects_with_issues_count, 2);
    assert_eq!(summary.projects_with_stuck_chain_count, 1);
    assert_eq!(summary.projects_with_incomplete_walk_count, 0);
    assert_eq!(summary.overall_dag_chain_gaps, 1);
    assert_eq!(summary.overall_dag_chain_duplicates, 0);
    assert_eq!(summary.overall_issue_count, 2);
    assert_eq!(summary.current_min_chain_height, 2);

    let b = report.project("b").unwrap();
    assert_eq!(b.issues.len(), 1);
    assert_eq!(b.issues[0].issue_type, IssueType::Gap);
    assert_eq!(b.issues[0].missing_height_start, 6);
    assert_eq!(b.issues[0].missing_height_end, 6);
    assert_eq!(b.issues[0].dag_block_height, 7);

    let c = report.project("c").unwrap();
    assert_eq!(c.issues[0].issue_type, IssueType::Stuck);
    assert_eq!(c.nodes_walked, 1);
    assert_eq!(c.stop, "reached_verified");

    assert!(report.project("a").unwrap().issues.is_empty());
    assert!(report.cancelled.is_empty());
}

#[tokio::test]
async fn test_gap_reported_once_then_only_new_range_walked() {
    let store = MemoryStore::new();
    let tracker = HeadTracker::new();
    let head = put_chain(&store, "b", &[1, 2, 4]).await;

    let first = create_runner(
        &store,
        StaticHeadSource::new().with_head("b", &head),
        tracker.clone(),
        RateLimit::Unlimited,
    )
    .run_at(&ids(&["b"]), CancelSignal::never(), now())
    .await;
    assert_eq!(first.summary.overall_dag_chain_gaps, 1);

    // chain grows past the verified head with a new gap at 6
    store
        .put_json("b-5", &json!({ "height": 5, "prevCid": "b-4" }))
        .await
        .unwrap();
    store
        .put_json("b-7", &json!({ "height": 7, "prevCid": "b-5" }))
        .await
        .unwrap();

    let second = create_runner(
        &store,
        StaticHeadSource::new().with_head("b", "b-7"),
        tracker.clone(),
        RateLimit::Unlimited,
    )
    .run_at(
        &ids(&["b"]),
        CancelSignal::never(),
        now() + ChronoDuration::minutes(5),
    )
    .await;

    let b = second.project("b").unwrap();
    assert_eq!(b.nodes_walked, 3);
    assert_eq!(b.issues.len(), 1);
    assert_eq!(b.issues[0].missing_height_start, 6);
    assert_eq!(store.read_count("b-2").await, 1);
    assert_eq!(tracker.get("b").await.unwrap().verified_height, Some(7));
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_shared_across_projects() {
    let store = MemoryStore::new();
    let x = put_chain(&store, "x", &[1, 2, 3]).await;
    let y = put_chain(&store, "y", &[1, 2, 3]).await;
    let heads = StaticHeadSource::new().with_head("x", &x).with_head("y", &y);
    let runner = create_runner(
        &store,
        heads,
        HeadTracker::new(),
        RateLimit::PerSecond {
            requests_per_second: 10.0,
            burst: 1,
        },
    );

    let start = tokio::time::Instant::now();
    let report = runner.run(&ids(&["x", "y"])).await;

    // six fetches, one from the burst and five paced at 100ms
    assert!(tokio::time::Instant::now() - start >= Duration::from_millis(450));
    assert_eq!(report.summary.projects_tracked_count, 2);
    assert!(!report.summary.has_issues());
}

// ============ Cancellation Tests ============

#[tokio::test(start_paused = true)]
async fn test_cancel_keeps_finished_projects() {
    let store = MemoryStore::new();
    let fast = put_chain(&store, "fast", &[1, 2]).await;
    let slow = put_chain(&store, "slow", &[1, 2, 3]).await;
    store.delay("slow-2", Duration::from_secs(600)).await;
    let heads = StaticHeadSource::new()
        .with_head("fast", &fast)
        .with_head("slow", &slow);
    let runner = create_runner(&store, heads, HeadTracker::new(), RateLimit::Unlimited)
        .with_run_timeout(Duration::from_secs(3_600));

    let (handle, signal) = cancel_pair();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        handle.cancel();
    });

    let report = runner.run_until(&ids(&["fast", "slow"]), signal).await;

    assert_eq!(report.cancelled, vec!["slow".to_string()]);
    assert_eq!(report.projects.len(), 1);
    assert_eq!(report.summary.projects_tracked_count, 1);
    assert_eq!(report.summary.current_min_chain_height, 2);
    assert!(runner.tracker().get("slow").await.is_none());
}

// ============ Notification Tests ============

#[tokio::test]
async fn test_summary_delivered_to_webhook() {
    let store = MemoryStore::new();
    let tracker = HeadTracker::new();
    let heads = three_projects(&store, &tracker).await;
    let runner = create_runner(&store, heads, tracker, RateLimit::Unlimited);
    let report = runner
        .run_at(&ids(&["a", "b", "c"]), CancelSignal::never(), now())
        .await;

    let server = MockServer::start().await;
    let expected = NotifyRequest::from_summary(&report.summary).unwrap();
    Mock::given(method("POST"))
        .and(path("/hooks/dag"))
        .and(body_json(&expected))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = NotificationDispatcher::new(
        &format!("{}/hooks/dag", server.uri()),
        Duration::from_secs(5),
    )
    .unwrap();
    let delivery = deliver(&dispatcher, &report.summary, &RetryPolicy::default())
        .await
        .unwrap();

    assert_eq!(delivery.attempts, 1);
    let summary: serde_json::Value = serde_json::from_str(&expected.dag_chain_summary).unwrap();
    assert_eq!(summary["projectsTracked_Count"], 3);
    assert_eq!(summary["overallDAGChainGaps"], 1);
}

#[tokio::test]
async fn test_transient_failures_retried_until_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = NotificationDispatcher::new(&server.uri(), Duration::from_secs(5)).unwrap();
    let policy = RetryPolicy::new(3, RetryStrategy::Fixed { delay_ms: 10 });
    let delivery = deliver(&dispatcher, &Default::default(), &policy)
        .await
        .unwrap();

    assert_eq!(
        delivery.decisions,
        vec![
            RetryDecision::RetryWithDelay,
            RetryDecision::RetryWithDelay,
            RetryDecision::NoRetrySuccess
        ]
    );
}

#[tokio::test]
async fn test_permanent_failure_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": false,
            "error": "channel_not_found"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = NotificationDispatcher::new(&server.uri(), Duration::from_secs(5)).unwrap();
    let policy = RetryPolicy::new(5, RetryStrategy::Fixed { delay_ms: 10 });
    let result = deliver(&dispatcher, &Default::default(), &policy).await;

    match result {
        Err(NotifyError::Rejected(detail)) => assert!(detail.contains("channel_not_found")),
        other => panic!("expected rejection, got {:?}", other),
    }
}

#[tokio::test]
async fn test_exhausted_retries_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "ok": false,
            "error": "internal_error"
        })))
        .expect(2)
        .mount(&server)
        .await;

    let dispatcher = NotificationDispatcher::new(&server.uri(), Duration::from_secs(5)).unwrap();
    let policy = RetryPolicy::new(2, RetryStrategy::Fixed { delay_ms: 10 });
    let result = deliver(&dispatcher, &Default::default(), &policy).await;

    assert!(matches!(
        result,
        Err(NotifyError::RetryExhausted { attempts: 2, .. })
    ));
}
