// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for [`Flight::work`].

use std::{
    sync::{
        Arc,
        atomic::{
            AtomicUsize,
            Ordering::{AcqRel, Acquire},
        },
    },
    time::Duration,
};

use cachemesh_flight::Flight;
use futures_util::{StreamExt, stream::FuturesUnordered};

#[tokio::test]
async fn direct_call() {
    let flight: Flight<String, String> = Flight::new();
    let result = flight
        .work("key".to_string(), || async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            "Result".to_string()
        })
        .await;
    assert_eq!(result, "Result");
}

#[tokio::test]
async fn concurrent_callers_share_one_execution() {
    let executions = AtomicUsize::new(0);
    let flight: Flight<String, usize> = Flight::new();

    let futures = FuturesUnordered::new();
    for _ in 0..100 {
        futures.push(flight.work("key".to_string(), || async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            executions.fetch_add(1, AcqRel) + 1
        }));
    }

    let results: Vec<usize> = futures.collect().await;
    assert_eq!(results.len(), 100);
    assert!(results.iter().all(|&r| r == 1));
    assert_eq!(executions.load(Acquire), 1);
}

#[tokio::test]
async fn distinct_keys_run_independently() {
    let executions = AtomicUsize::new(0);
    let flight: Flight<String, String> = Flight::new();

    let slow = flight.work("slow".to_string(), || async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        executions.fetch_add(1, AcqRel);
        "slow".to_string()
    });
    let fast = flight.work("fast".to_string(), || async {
        executions.fetch_add(1, AcqRel);
        "fast".to_string()
    });

    let (slow_result, fast_result) = tokio::join!(slow, fast);
    assert_eq!(slow_result, "slow");
    assert_eq!(fast_result, "fast");
    assert_eq!(executions.load(Acquire), 2);
}

#[tokio::test]
async fn key_is_vacant_after_delivery() {
    let executions = AtomicUsize::new(0);
    let flight: Flight<String, usize> = Flight::new();

    for expected in 1..=3 {
        let result = flight
            .work("key".to_string(), || async { executions.fetch_add(1, AcqRel) + 1 })
            .await;
        assert_eq!(result, expected);
    }
    assert_eq!(executions.load(Acquire), 3);
}

#[tokio::test]
async fn errors_reach_every_waiter() {
    let executions = AtomicUsize::new(0);
    let flight: Flight<String, Result<String, String>> = Flight::new();

    let futures = FuturesUnordered::new();
    for _ in 0..10 {
        futures.push(flight.work("key".to_string(), || async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            executions.fetch_add(1, AcqRel);
            Err::<String, String>("origin is down".to_string())
        }));
    }

    let results: Vec<Result<String, String>> = futures.collect().await;
    assert!(results.iter().all(|r| matches!(r, Err(reason) if reason == "origin is down")));
    assert_eq!(executions.load(Acquire), 1);
}

#[tokio::test]
async fn errors_are_not_cached_across_episodes() {
    let executions = AtomicUsize::new(0);
    let flight: Flight<String, Result<String, String>> = Flight::new();

    let first = flight
        .work("key".to_string(), || async {
            executions.fetch_add(1, AcqRel);
            Err::<String, String>("transient".to_string())
        })
        .await;
    assert!(first.is_err());

    let second = flight
        .work("key".to_string(), || async {
            executions.fetch_add(1, AcqRel);
            Ok::<String, String>("recovered".to_string())
        })
        .await;
    assert_eq!(second.as_deref(), Ok("recovered"));
    assert_eq!(executions.load(Acquire), 2);
}

#[tokio::test]
async fn dropped_leader_promotes_a_follower() {
    let flight: Arc<Flight<String, String>> = Arc::new(Flight::new());

    // A leader that never completes, dropped via timeout.
    let stuck = flight.work("key".to_string(), || std::future::pending::<String>());
    let _ = tokio::time::timeout(Duration::from_millis(10), stuck).await;

    // The next caller must not inherit the dead episode.
    let result = flight
        .work("key".to_string(), || async { "Result".to_string() })
        .await;
    assert_eq!(result, "Result");
}

#[tokio::test]
async fn slow_leader_still_wins() {
    let flight: Flight<String, String> = Flight::new();

    let lead = flight.work("key".to_string(), || async {
        tokio::time::sleep(Duration::from_millis(200)).await;
        "from-leader".to_string()
    });
    let follow = flight.work("key".to_string(), || async { "from-follower".to_string() });

    let (lead_result, follow_result) = tokio::join!(lead, follow);
    assert_eq!(lead_result, "from-leader");
    assert_eq!(follow_result, "from-leader");
}
