//! Admission service boundary behavior

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokengate::prelude::*;

fn service(
    policies: &MemoryPolicyStore,
    buckets: &MemoryBucketStore,
    deadline: Duration,
) -> AdmissionService<MemoryPolicyStore, MemoryBucketStore> {
    let engine = LimiterEngine::new(
        policies.clone(),
        buckets.clone(),
        Arc::new(LoadCell::new()),
        false,
    );
    AdmissionService::new(engine, deadline)
}

#[tokio::test]
async fn delegates_to_the_engine() {
    let policies = MemoryPolicyStore::new();
    policies.put("c1", 5, 10);
    let buckets = MemoryBucketStore::new();
    let service = service(&policies, &buckets, Duration::from_secs(1));

    let admission = service.check_rate_limit("c1", 3).await.unwrap();
    assert_eq!(
        admission,
        Admission {
            allowed: true,
            remaining: 2
        }
    );
}

#[tokio::test]
async fn empty_client_id_is_invalid_and_touches_nothing() {
    let policies = MemoryPolicyStore::new();
    let buckets = MemoryBucketStore::new();
    let service = service(&policies, &buckets, Duration::from_secs(1));

    let err = service.check_rate_limit("", 1).await.unwrap_err();
    assert!(matches!(err, LimiterError::InvalidArgument(_)));
    assert!(buckets.is_empty());
}

#[tokio::test]
async fn negative_tokens_required_is_invalid_and_touches_nothing() {
    let policies = MemoryPolicyStore::new();
    policies.put("c1", 5, 10);
    let buckets = MemoryBucketStore::new();
    let service = service(&policies, &buckets, Duration::from_secs(1));

    let err = service.check_rate_limit("c1", -1).await.unwrap_err();
    assert!(matches!(err, LimiterError::InvalidArgument(_)));
    assert!(buckets.is_empty());
}

#[tokio::test]
async fn unknown_client_maps_through() {
    let policies = MemoryPolicyStore::new();
    let buckets = MemoryBucketStore::new();
    let service = service(&policies, &buckets, Duration::from_secs(1));

    let err = service.check_rate_limit("ghost", 1).await.unwrap_err();
    assert!(matches!(err, LimiterError::UnknownClient(_)));
    assert!(!err.is_transient());
}

/// Policy backend that never answers within an admission deadline.
#[derive(Debug, Clone)]
struct StalledPolicyStore;

#[async_trait]
impl PolicyStore for StalledPolicyStore {
    async fn lookup(&self, _client_id: &str) -> Result<RefillPolicy> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(RefillPolicy {
            capacity: 5,
            refill_interval_secs: 10,
        })
    }
}

#[tokio::test(start_paused = true)]
async fn expired_deadline_surfaces_as_transient() {
    let buckets = MemoryBucketStore::new();
    let engine = LimiterEngine::new(
        StalledPolicyStore,
        buckets.clone(),
        Arc::new(LoadCell::new()),
        false,
    );
    let service = AdmissionService::new(engine, Duration::from_millis(50));

    let err = service.check_rate_limit("c1", 1).await.unwrap_err();
    assert!(matches!(err, LimiterError::DeadlineExceeded));
    assert!(err.is_transient());
}
