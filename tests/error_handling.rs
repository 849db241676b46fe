//! 错误处理集成测试
//!
//! 测试错误分类、错误在服务中的传播以及失败响应的结构

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use naver_dict::dictionary::{
    ConfigManager, DictConfig, DictError, DictType, ErrorKind, LookupFailure,
};
use naver_dict::network::{classify_status, extract_word_items};
use serde_json::json;

mod common {
    include!("common/mod.rs");
}

use common::{build_service, test_config, StubFetcher};

#[test]
fn test_error_kind_wire_names() {
    let names: Vec<String> = ErrorKind::ALL
        .iter()
        .map(|kind| serde_json::to_value(kind).unwrap().as_str().unwrap().to_string())
        .collect();

    for (kind, name) in ErrorKind::ALL.iter().zip(&names) {
        assert_eq!(kind.as_str(), name);
    }
    assert!(names.contains(&"rate_limit".to_string()));
    assert!(names.contains(&"upstream_rate_limit".to_string()));
    assert!(names.contains(&"http_error".to_string()));
}

#[test]
fn test_status_classification() {
    assert!(classify_status(200, None, String::new()).is_ok());

    let not_found = classify_status(404, None, "Not Found".into()).unwrap_err();
    assert_eq!(not_found.kind(), ErrorKind::HttpError);
    assert!(!not_found.is_retryable());

    let throttled =
        classify_status(429, Some(Duration::from_secs(7)), "Too Many Requests".into()).unwrap_err();
    assert_eq!(throttled.kind(), ErrorKind::UpstreamRateLimit);
    assert_eq!(throttled.retry_after(), Some(Duration::from_secs(7)));
    assert!(throttled.details().contains("retry_after=7s"));

    let server = classify_status(503, None, "Service Unavailable".into()).unwrap_err();
    assert_eq!(server.kind(), ErrorKind::UpstreamServerError);
    assert!(server.is_retryable());
}

#[test]
fn test_upstream_body_extraction() {
    let body = json!({
        "searchResultMap": {
            "searchResultListMap": {
                "WORD": { "items": [{ "expEntry": "학교" }, { "expEntry": "학교2" }] }
            }
        }
    });
    assert_eq!(extract_word_items(&body).unwrap().len(), 2);

    let empty = json!({ "searchResultMap": { "searchResultListMap": {} } });
    assert!(extract_word_items(&empty).unwrap().is_not_found());

    let malformed = json!({ "unexpected": true });
    assert_eq!(
        extract_word_items(&malformed).unwrap_err().kind(),
        ErrorKind::ParseError
    );
}

#[tokio::test]
async fn test_upstream_errors_propagate_with_their_kind() {
    let fetcher = Arc::new(
        StubFetcher::new()
            .fail_with(
                "없는페이지",
                DictError::UpstreamHttp {
                    status: 404,
                    message: "Not Found".into(),
                },
            )
            .fail_with(
                "과부하",
                DictError::UpstreamRateLimit {
                    retry_after: Some(Duration::from_secs(30)),
                    message: "Too Many Requests".into(),
                },
            ),
    );
    let service = build_service(test_config(), fetcher.clone());

    let http = service.lookup("없는페이지", DictType::KoZh).await.unwrap_err();
    assert_eq!(http.kind(), ErrorKind::HttpError);

    let throttled = service.lookup("과부하", DictType::KoZh).await.unwrap_err();
    assert_eq!(throttled.kind(), ErrorKind::UpstreamRateLimit);
    assert_eq!(throttled.retry_after(), Some(Duration::from_secs(30)));

    assert_eq!(fetcher.call_count(), 2);

    let snapshot = service.metrics_snapshot();
    assert_eq!(snapshot.error_counts_by_kind["http_error"], 1);
    assert_eq!(snapshot.error_counts_by_kind["upstream_rate_limit"], 1);
    assert_eq!(snapshot.failed_requests, 2);
}

/// 上游接受连接但从不响应：每次尝试都应单独超时并重试，直到用完次数
#[tokio::test]
async fn test_unresponsive_upstream_is_retried_until_attempts_run_out() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let accepted = Arc::new(AtomicUsize::new(0));

    let counter = accepted.clone();
    let server = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            held.push(socket);
        }
    });

    let mut config = DictConfig::default();
    config.base_url = format!("http://127.0.0.1:{}", port);
    config.http_timeout_secs = 1;
    config.retry_max_attempts = 3;
    config.retry_base_delay_ms = 10;
    config.retry_max_delay_ms = 20;
    config.fetch_timeout_secs = 10;
    let service = naver_dict::DictionaryService::new(config).unwrap();

    let error = service.lookup("학교", DictType::KoZh).await.unwrap_err();
    server.abort();

    assert_eq!(error.kind(), ErrorKind::Timeout);
    assert_eq!(accepted.load(Ordering::SeqCst), 3);
}

#[test]
fn test_failure_json_fields() {
    let error = DictError::UpstreamServer {
        status: 500,
        message: "Internal Server Error".into(),
    };
    let failure = LookupFailure::from_error("학교", "학교", &error, true, Some(DictType::KoZh));
    let value = serde_json::to_value(&failure).unwrap();

    assert_eq!(value["success"], false);
    assert_eq!(value["word"], "학교");
    assert_eq!(value["error_type"], "upstream_server_error");
    assert_eq!(value["details"], "status=500, Internal Server Error");
    assert_eq!(value["deduped"], true);
    assert_eq!(value["from_cache"], false);
    assert_eq!(value["dict_type"], "ko-zh");
    assert!(value["error"].as_str().unwrap().contains("500"));
}

#[test]
fn test_unknown_dict_type_is_validation_error() {
    let error = "fr".parse::<DictType>().unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Validation);
    assert_eq!("KO-EN".parse::<DictType>().unwrap(), DictType::KoEn);
}

#[test]
fn test_invalid_config_rejected_at_construction() {
    let mut config = test_config();
    config.batch_max_concurrency = 0;
    let error = naver_dict::DictionaryService::with_fetcher(config, Arc::new(StubFetcher::new()))
        .err()
        .expect("zero concurrency must be rejected");
    assert_eq!(error.kind(), ErrorKind::Config);
}

/// 环境变量是进程级状态，相关断言放在同一个测试里
#[test]
fn test_config_file_and_env_errors() {
    let dir = std::env::temp_dir().join(format!("naver-dict-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    let bad_file = dir.join("bad.toml");
    std::fs::write(&bad_file, "cache_capacity = 0\n").unwrap();
    let error = ConfigManager::from_file(bad_file.to_str().unwrap())
        .err()
        .expect("zero capacity must be rejected");
    assert_eq!(error.kind(), ErrorKind::Config);

    let missing = dir.join("missing.toml");
    assert!(ConfigManager::from_file(missing.to_str().unwrap()).is_err());

    std::env::set_var("NAVER_DICT_CACHE_CAPACITY", "abc");
    let mut config = DictConfig::default();
    let result = config.apply_env_overrides();
    std::env::remove_var("NAVER_DICT_CACHE_CAPACITY");
    assert_eq!(result.unwrap_err().kind(), ErrorKind::Config);

    std::env::set_var("NAVER_DICT_CACHE_CAPACITY", "7");
    let mut config = DictConfig::default();
    let result = config.apply_env_overrides();
    std::env::remove_var("NAVER_DICT_CACHE_CAPACITY");
    assert!(result.is_ok());
    assert_eq!(config.cache_capacity, 7);

    std::fs::remove_dir_all(&dir).ok();
}
