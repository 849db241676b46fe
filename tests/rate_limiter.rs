//! 限流集成测试

use std::sync::Arc;
use std::time::Duration;

use naver_dict::dictionary::{DictError, DictType, ErrorKind, TokenBucket};

mod common {
    include!("common/mod.rs");
}

use common::{build_service, test_config, StubFetcher};

/// 每分钟1次：第二次被拒绝，60秒后恢复
#[tokio::test(start_paused = true)]
async fn test_one_per_minute_recovers_after_sixty_seconds() {
    let bucket = TokenBucket::per_minute(1);

    assert!(bucket.try_acquire(1.0));
    assert!(!bucket.try_acquire(1.0));

    tokio::time::advance(Duration::from_secs(60)).await;
    assert!(bucket.try_acquire(1.0));
}

#[tokio::test(start_paused = true)]
async fn test_refill_never_exceeds_capacity() {
    let bucket = TokenBucket::new(5.0, 10.0);
    tokio::time::advance(Duration::from_secs(3600)).await;

    assert!((bucket.remaining() - 5.0).abs() < 1e-6);
    for _ in 0..5 {
        assert!(bucket.try_acquire(1.0));
    }
    assert!(!bucket.try_acquire(1.0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_acquire_grants_exactly_capacity() {
    let bucket = Arc::new(TokenBucket::new(10.0, 0.0001));

    let handles: Vec<_> = (0..40)
        .map(|_| {
            let bucket = bucket.clone();
            tokio::spawn(async move { bucket.try_acquire(1.0) })
        })
        .collect();

    let mut granted = 0;
    for handle in handles {
        if handle.await.unwrap() {
            granted += 1;
        }
    }
    assert_eq!(granted, 10);
}

#[tokio::test]
async fn test_exhausted_bucket_rejects_new_words_but_serves_cache() {
    let mut config = test_config();
    config.rate_limit_capacity = 1.0;
    config.rate_limit_refill_per_sec = 0.001;
    let fetcher = Arc::new(StubFetcher::new());
    let service = build_service(config, fetcher.clone());

    service.lookup("학교", DictType::KoZh).await.unwrap();

    let error = service.lookup("학생", DictType::KoZh).await.unwrap_err();
    assert!(matches!(error, DictError::RateLimitExceeded(_)));
    assert_eq!(error.kind(), ErrorKind::RateLimit);

    let cached = service.lookup("학교", DictType::KoZh).await.unwrap();
    assert!(cached.from_cache);
    assert_eq!(fetcher.call_count(), 1);

    let snapshot = service.metrics_snapshot();
    assert_eq!(snapshot.error_counts_by_kind["rate_limit"], 1);
    assert_eq!(snapshot.successful_requests, 2);
}

#[tokio::test(start_paused = true)]
async fn test_wait_mode_blocks_until_refill() {
    let mut config = test_config();
    config.rate_limit_capacity = 1.0;
    config.rate_limit_refill_per_sec = 1.0;
    config.rate_limit_wait = true;
    config.rate_limit_wait_timeout_secs = 5;
    let fetcher = Arc::new(StubFetcher::new());
    let service = build_service(config, fetcher.clone());

    service.lookup("가", DictType::KoZh).await.unwrap();

    let start = tokio::time::Instant::now();
    let second = service.lookup("나", DictType::KoZh).await.unwrap();
    let waited = start.elapsed();

    assert!(!second.from_cache);
    assert!(waited >= Duration::from_millis(900), "waited {:?}", waited);
    assert!(waited <= Duration::from_millis(1500), "waited {:?}", waited);
    assert_eq!(fetcher.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_wait_mode_gives_up_at_timeout() {
    let mut config = test_config();
    config.rate_limit_capacity = 1.0;
    config.rate_limit_refill_per_sec = 0.01;
    config.rate_limit_wait = true;
    config.rate_limit_wait_timeout_secs = 2;
    let fetcher = Arc::new(StubFetcher::new());
    let service = build_service(config, fetcher.clone());

    service.lookup("가", DictType::KoZh).await.unwrap();

    let start = tokio::time::Instant::now();
    let error = service.lookup("나", DictType::KoZh).await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::RateLimit);
    assert!(start.elapsed() >= Duration::from_secs(2));
    assert!(start.elapsed() < Duration::from_secs(3));
    assert_eq!(fetcher.call_count(), 1);
}

#[tokio::test]
async fn test_validation_failures_do_not_consume_tokens() {
    let mut config = test_config();
    config.rate_limit_capacity = 2.0;
    config.rate_limit_refill_per_sec = 0.001;
    let service = build_service(config, Arc::new(StubFetcher::new()));

    for _ in 0..5 {
        assert!(service.lookup("   ", DictType::KoZh).await.is_err());
    }

    assert!(service.limiter().remaining() > 1.99);
}
