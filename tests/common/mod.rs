// 集成测试公共模块
//
// 提供可编程的桩获取器和服务构造辅助函数

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::BoxFuture;
use serde_json::json;

use naver_dict::dictionary::{
    DictConfig, DictError, DictResult, DictType, DictionaryService, LookupPayload,
};
use naver_dict::network::Fetcher;

/// 桩获取器
///
/// 记录每次调用，统计并发峰值，并可按词预设失败或未找到。
pub struct StubFetcher {
    calls: Mutex<Vec<(String, DictType)>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    delay: Duration,
    word_delays: HashMap<String, Duration>,
    failures: HashMap<String, DictError>,
    not_found: HashSet<String>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            delay: Duration::ZERO,
            word_delays: HashMap::new(),
            failures: HashMap::new(),
            not_found: HashSet::new(),
        }
    }

    /// 每次调用前等待
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// 只对指定词等待，覆盖 `with_delay`
    pub fn with_word_delay(mut self, word: &str, delay: Duration) -> Self {
        self.word_delays.insert(word.to_string(), delay);
        self
    }

    /// 对指定词返回错误
    pub fn fail_with(mut self, word: &str, error: DictError) -> Self {
        self.failures.insert(word.to_string(), error);
        self
    }

    /// 对指定词返回空结果
    pub fn not_found(mut self, word: &str) -> Self {
        self.not_found.insert(word.to_string());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_for(&self, word: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(called, _)| called == word)
            .count()
    }

    pub fn called_words(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(word, _)| word.clone())
            .collect()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

impl Fetcher for StubFetcher {
    fn fetch<'a>(
        &'a self,
        word: &'a str,
        dict_type: DictType,
    ) -> BoxFuture<'a, DictResult<LookupPayload>> {
        Box::pin(async move {
            self.calls
                .lock()
                .unwrap()
                .push((word.to_string(), dict_type));

            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(current, Ordering::SeqCst);

            let delay = self.word_delays.get(word).copied().unwrap_or(self.delay);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if let Some(error) = self.failures.get(word) {
                return Err(error.clone());
            }
            if self.not_found.contains(word) {
                return Ok(LookupPayload::default());
            }
            Ok(sample_payload(word))
        })
    }
}

/// 与上游 WORD.items 结构相同的样例词条
pub fn sample_payload(word: &str) -> LookupPayload {
    LookupPayload::new(vec![json!({
        "expEntry": word,
        "searchPhoneticSymbolList": [{ "symbolValue": format!("[{}]", word) }],
        "meansCollector": [{
            "partOfSpeech": "감탄사",
            "means": [{ "value": "你好" }]
        }]
    })])
}

/// 测试用配置：令牌充足，重试与超时较短
pub fn test_config() -> DictConfig {
    let mut config = DictConfig::default();
    config.rate_limit_capacity = 100.0;
    config.rate_limit_refill_per_sec = 1.0;
    config.batch_max_concurrency = 3;
    config.http_timeout_secs = 1;
    config.fetch_timeout_secs = 5;
    config
}

/// 用桩获取器构造隔离的服务实例
pub fn build_service(config: DictConfig, fetcher: Arc<StubFetcher>) -> DictionaryService {
    DictionaryService::with_fetcher(config, fetcher).expect("test config should be valid")
}

pub fn words(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}
