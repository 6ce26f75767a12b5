mod utils;
use utils::*;

use std::time::Duration;

use leaderboard_util::{EndpointHits, FieldCasing};
use loadgen::config::{IdentityMode, MixConfig, Range, StopCondition};
use loadgen::error::IssueError;
use loadgen::{ActionKind, RequestIssuer, RunConfig};
use tracing_test::traced_test;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn contended_single_user_submits() {
    let (base_url, board) = spawn_mock().await;
    let config = RunConfig {
        base_url,
        workers: 10,
        stop: StopCondition::Iterations(1),
        mix: MixConfig::Weighted {
            submit: 1,
            rank: 0,
            top: 0,
        },
        user_ids: Range::new(1, 1),
        scores: Range::new(5, 5),
        ..RunConfig::default()
    }
    .validated()
    .unwrap();

    let summary = loadgen::run(&config, issuer_for(&config)).await.unwrap();

    let submit = summary.kind(ActionKind::Submit);
    assert_eq!(submit.requests(), 10);
    assert!(submit.successes <= 10);
    assert_eq!(submit.successes + submit.failures(), 10);
    assert_eq!(summary.total_requests(), 10);
    assert_eq!(
        board.hits(),
        EndpointHits {
            submit: 10,
            rank: 0,
            top: 0
        }
    );
    assert_eq!(board.total(1), Some(5 * submit.successes));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn read_only_mix_never_submits() {
    let (base_url, board) = spawn_mock().await;
    let duration = Duration::from_secs(2);
    let config = RunConfig {
        base_url,
        workers: 5,
        stop: StopCondition::Duration(duration),
        mix: MixConfig::Weighted {
            submit: 0,
            rank: 1,
            top: 1,
        },
        think_time_ms: Some(Range::new(5, 15)),
        ..RunConfig::default()
    }
    .validated()
    .unwrap();

    let summary = loadgen::run(&config, issuer_for(&config)).await.unwrap();

    assert_eq!(summary.kind(ActionKind::Submit).requests(), 0);
    assert_eq!(board.hits().submit, 0);
    assert!(summary.kind(ActionKind::Rank).requests() > 0);
    assert!(summary.kind(ActionKind::Top).requests() > 0);
    // Nothing was ever submitted, so every rank lookup is a 404.
    assert_eq!(summary.kind(ActionKind::Rank).successes, 0);
    assert_eq!(
        summary.kind(ActionKind::Rank).protocol_failures,
        summary.kind(ActionKind::Rank).requests()
    );
    assert_eq!(summary.kind(ActionKind::Top).failures(), 0);
    assert!(summary.elapsed >= duration);
    assert!(summary.elapsed < duration + Duration::from_secs(1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn layered_mix_ranks_what_it_submitted() {
    let (base_url, board) = spawn_mock().await;
    let config = RunConfig {
        base_url,
        workers: 4,
        stop: StopCondition::Iterations(20),
        mix: MixConfig::Layered { top_chance: 0.1 },
        user_ids: Range::new(1, 1_000_000),
        field_casing: FieldCasing::Snake,
        seed: Some(99),
        ..RunConfig::default()
    }
    .validated()
    .unwrap();

    let summary = loadgen::run(&config, issuer_for(&config)).await.unwrap();

    assert_eq!(summary.totals.iterations, 80);
    assert_eq!(summary.kind(ActionKind::Submit).successes, 80);
    assert_eq!(summary.kind(ActionKind::Rank).successes, 80);
    assert_eq!(summary.total_failures(), 0);
    let hits = board.hits();
    assert_eq!(hits.submit, 80);
    assert_eq!(hits.rank, 80);
    assert_eq!(hits.top as u64, summary.kind(ActionKind::Top).successes);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn pinned_workers_reuse_their_user() {
    let (base_url, board) = spawn_mock().await;
    let config = RunConfig {
        base_url,
        workers: 1,
        stop: StopCondition::Iterations(12),
        mix: MixConfig::Weighted {
            submit: 1,
            rank: 0,
            top: 0,
        },
        identity: IdentityMode::PerWorker,
        user_ids: Range::new(1, 1_000_000),
        scores: Range::new(1, 1),
        ..RunConfig::default()
    }
    .validated()
    .unwrap();

    loadgen::run(&config, issuer_for(&config)).await.unwrap();

    let top = board.top(10);
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].total_score, 12);
}

#[tokio::test]
#[traced_test]
async fn unreachable_service_is_survived() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = RunConfig {
        base_url: format!("http://{addr}/api/leaderboard"),
        workers: 3,
        stop: StopCondition::Iterations(4),
        ..RunConfig::default()
    }
    .validated()
    .unwrap();

    let summary = loadgen::run(&config, issuer_for(&config)).await.unwrap();

    assert_eq!(summary.totals.iterations, 12);
    assert_eq!(summary.total_requests(), 12);
    assert_eq!(summary.total_successes(), 0);
    let transport: u64 = ActionKind::ALL
        .iter()
        .map(|kind| summary.kind(*kind).transport_failures)
        .sum();
    assert_eq!(transport, 12);
    assert!(logs_contain("request failed"));
    assert!(summary.to_string().contains("Load test completed in"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn request_timeout_bounds_a_silent_service() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });

    let config = RunConfig {
        base_url: format!("http://{addr}/api/leaderboard"),
        workers: 2,
        stop: StopCondition::Iterations(2),
        request_timeout: Duration::from_millis(200),
        ..RunConfig::default()
    }
    .validated()
    .unwrap();

    let summary = loadgen::run(&config, issuer_for(&config)).await.unwrap();

    assert_eq!(summary.total_requests(), 4);
    assert_eq!(summary.total_successes(), 0);
    assert!(
        summary.elapsed < Duration::from_secs(2),
        "took {:?}",
        summary.elapsed
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn issuer_reports_status_and_body_problems() {
    let (base_url, _board) = spawn_mock().await;
    let config = RunConfig {
        base_url,
        ..RunConfig::default()
    };
    let issuer = issuer_for(&config);

    let outcome = issuer.get_rank(42).await;
    assert_eq!(
        outcome.error(),
        Some(&IssueError::Status(hyper::StatusCode::NOT_FOUND))
    );

    let outcome = issuer.submit_score(42, 10).await;
    assert!(outcome.is_success(), "{outcome:?}");
    let outcome = issuer.get_rank(42).await;
    assert!(outcome.is_success(), "{outcome:?}");
    let outcome = issuer.get_top().await;
    assert!(outcome.is_success(), "{outcome:?}");
}
