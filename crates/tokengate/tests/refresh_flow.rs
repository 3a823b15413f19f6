//! Cache refresher behavior against the in-memory stores

use std::sync::Arc;
use tokengate::prelude::*;

fn fixtures() -> (
    MemoryPolicyStore,
    MemoryBucketStore,
    LimiterEngine<MemoryPolicyStore, MemoryBucketStore>,
    CacheRefresher<MemoryPolicyStore, MemoryBucketStore>,
) {
    let policies = MemoryPolicyStore::new();
    let buckets = MemoryBucketStore::new();
    let engine = LimiterEngine::new(
        policies.clone(),
        buckets.clone(),
        Arc::new(LoadCell::new()),
        false,
    );
    let refresher = CacheRefresher::new(policies.clone(), buckets.clone());
    (policies, buckets, engine, refresher)
}

#[tokio::test]
async fn refresh_then_admit_round_trip() {
    let (policies, _buckets, engine, refresher) = fixtures();
    policies.put("c1", 5, 10);

    let policy = refresher.refresh_one("c1").await.unwrap();
    assert_eq!(policy.capacity, 5);

    let admission = engine.admit("c1", 3).await.unwrap();
    assert_eq!(
        admission,
        Admission {
            allowed: true,
            remaining: 2
        }
    );
}

#[tokio::test]
async fn refresh_one_restores_a_drained_bucket() {
    let (policies, buckets, engine, refresher) = fixtures();
    policies.put("c1", 5, 600);

    assert!(engine.admit("c1", 5).await.unwrap().allowed);
    assert_eq!(buckets.get("c1").await.unwrap(), Some(0));

    refresher.refresh_one("c1").await.unwrap();
    assert_eq!(buckets.get("c1").await.unwrap(), Some(5));
    assert!(buckets.get("c1_last_refill").await.unwrap().is_some());
}

#[tokio::test]
async fn refresh_one_unknown_client_touches_nothing() {
    let (_policies, buckets, _engine, refresher) = fixtures();

    let err = refresher.refresh_one("ghost").await.unwrap_err();
    assert!(matches!(err, LimiterError::UnknownClient(_)));
    assert!(buckets.is_empty());
}

#[tokio::test]
async fn refresh_all_then_admission_lazily_reinitializes() {
    // A client drained to one token gets a full fresh bucket after the
    // flush, so a request for the whole capacity goes through.
    let (policies, buckets, engine, refresher) = fixtures();
    policies.put("c1", 5, 600);

    assert!(engine.admit("c1", 4).await.unwrap().allowed);
    assert_eq!(buckets.get("c1").await.unwrap(), Some(1));

    refresher.refresh_all().await.unwrap();
    assert!(buckets.is_empty());

    let admission = engine.admit("c1", 5).await.unwrap();
    assert_eq!(
        admission,
        Admission {
            allowed: true,
            remaining: 0
        }
    );
}

#[tokio::test]
async fn refresh_all_is_idempotent() {
    let (policies, buckets, engine, refresher) = fixtures();
    policies.put("c1", 5, 600);
    assert!(engine.admit("c1", 1).await.unwrap().allowed);

    refresher.refresh_all().await.unwrap();
    refresher.refresh_all().await.unwrap();
    assert!(buckets.is_empty());
}

#[tokio::test]
async fn refresh_writes_base_capacity_not_scaled() {
    // The refresher propagates policy; load scaling belongs to
    // admissions only.
    let policies = MemoryPolicyStore::new();
    let buckets = MemoryBucketStore::new();
    policies.put("c1", 100, 600);

    let load = Arc::new(LoadCell::new());
    load.publish(LoadSample {
        cpu: 0.96,
        mem: 0.10,
    });
    let refresher = CacheRefresher::new(policies.clone(), buckets.clone());

    refresher.refresh_one("c1").await.unwrap();
    assert_eq!(buckets.get("c1").await.unwrap(), Some(100));
}
