//! 词典服务
//!
//! 对传输层暴露的统一入口。服务持有所有组件的 `Arc`，没有全局单例，
//! 测试可以构造相互隔离的实例。

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::time::Instant;

use crate::dictionary::config::DictConfig;
use crate::dictionary::error::{helpers, DictError, DictResult};
use crate::dictionary::limiter::TokenBucket;
use crate::dictionary::metrics::{MetricsCollector, MetricsSnapshot, Outcome};
use crate::dictionary::pipeline::{validate_word, BatchOrchestrator, BatchSettings};
use crate::dictionary::responses::{BatchResponse, LookupResponse};
use crate::dictionary::storage::{CacheKey, CacheStats, LookupCache};
use crate::dictionary::types::DictType;
use crate::network::{Fetcher, NaverFetcher};

/// 单词查询端点名
pub const ENDPOINT_SEARCH: &str = "search_word";
/// 批量查询端点名
pub const ENDPOINT_BATCH: &str = "batch_search_words";

/// 词典服务
pub struct DictionaryService {
    config: DictConfig,
    cache: Arc<LookupCache>,
    limiter: Arc<TokenBucket>,
    metrics: Arc<MetricsCollector>,
    fetcher: Arc<dyn Fetcher>,
    orchestrator: BatchOrchestrator,
    started_at: DateTime<Utc>,
}

impl DictionaryService {
    /// 使用 Naver 获取器创建服务
    pub fn new(config: DictConfig) -> DictResult<Self> {
        let fetcher = Arc::new(NaverFetcher::new(&config)?);
        Self::with_fetcher(config, fetcher)
    }

    /// 使用指定获取器创建服务
    pub fn with_fetcher(config: DictConfig, fetcher: Arc<dyn Fetcher>) -> DictResult<Self> {
        config.validate()?;

        let cache = Arc::new(LookupCache::new(config.cache_capacity, config.cache_ttl()));
        let limiter = Arc::new(TokenBucket::new(
            config.rate_limit_capacity,
            config.rate_limit_refill_per_sec,
        ));
        let metrics = Arc::new(MetricsCollector::new());
        let semaphore = Arc::new(Semaphore::new(config.batch_max_concurrency));

        let orchestrator = BatchOrchestrator::new(
            cache.clone(),
            limiter.clone(),
            fetcher.clone(),
            semaphore,
            BatchSettings::from_config(&config),
        );

        tracing::info!(
            "词典服务初始化完成: cache={}项/{}s, 限流={}/{}每秒, 并发上限={}",
            config.cache_capacity,
            config.cache_ttl_secs,
            config.rate_limit_capacity,
            config.rate_limit_refill_per_sec,
            config.batch_max_concurrency
        );

        Ok(Self {
            config,
            cache,
            limiter,
            metrics,
            fetcher,
            orchestrator,
            started_at: Utc::now(),
        })
    }

    /// 查询单个词
    pub async fn lookup(&self, word: &str, dict_type: DictType) -> DictResult<LookupResponse> {
        let start = Instant::now();
        let result = self.lookup_inner(word, dict_type).await;
        let latency = start.elapsed();

        match &result {
            Ok(response) => {
                self.metrics
                    .record(ENDPOINT_SEARCH, Outcome::Success, latency, None);
                tracing::info!(
                    "查询完成: word='{}', count={}, from_cache={}, latency={:.3}s",
                    response.word,
                    response.count,
                    response.from_cache,
                    latency.as_secs_f64()
                );
            }
            Err(error) => {
                helpers::log_error(error);
                self.metrics
                    .record(ENDPOINT_SEARCH, Outcome::Failure, latency, Some(error.kind()));
            }
        }

        result
    }

    async fn lookup_inner(&self, word: &str, dict_type: DictType) -> DictResult<LookupResponse> {
        let normalized = self.fetcher.normalize(word);
        validate_word(&normalized, self.config.max_word_length)?;

        let key = CacheKey::new(normalized.clone(), dict_type);
        if let Some(payload) = self.orchestrator.cached_payload(&key) {
            return Ok(LookupResponse::from_payload(
                &normalized,
                &payload,
                true,
                false,
                Some(dict_type),
            ));
        }

        let granted = self
            .limiter
            .acquire(
                1.0,
                self.config.rate_limit_wait,
                Some(self.config.rate_limit_wait_timeout()),
            )
            .await;
        if !granted {
            return Err(DictError::RateLimitExceeded(format!(
                "'{}' 未能获得令牌，请稍后重试",
                normalized
            )));
        }

        let payload = self.orchestrator.fetch_and_cache(&normalized, dict_type).await?;
        Ok(LookupResponse::from_payload(
            &normalized,
            &payload,
            false,
            false,
            Some(dict_type),
        ))
    }

    /// 批量查询
    pub async fn batch_lookup(
        &self,
        words: &[String],
        dict_type: DictType,
        return_raw_cached: bool,
    ) -> DictResult<BatchResponse> {
        let start = Instant::now();
        let result = self.orchestrator.run(words, dict_type, return_raw_cached).await;
        let latency = start.elapsed();

        match &result {
            Ok(response) => {
                for item in &response.results {
                    if let Some(kind) = item.error_kind() {
                        self.metrics.record_error(kind);
                    }
                }
                self.metrics.record(
                    ENDPOINT_BATCH,
                    Outcome::from_success(response.success),
                    latency,
                    None,
                );
            }
            Err(error) => {
                helpers::log_error(error);
                self.metrics
                    .record(ENDPOINT_BATCH, Outcome::Failure, latency, Some(error.kind()));
            }
        }

        result
    }

    /// 指标快照
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics
            .snapshot(self.cache_stats(), self.limiter.stats())
    }

    /// 缓存统计，先清理过期条目再汇报大小
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.cleanup_expired();
        self.cache.stats()
    }

    /// 清空缓存
    pub fn clear_cache(&self) -> usize {
        self.cache.clear()
    }

    /// 重置指标（缓存命中统计一并清零）
    pub fn reset_metrics(&self) {
        self.metrics.reset();
        self.cache.reset_stats();
    }

    /// 获取服务健康状态
    ///
    /// 令牌桶耗尽时整体为 `Degraded`：缓存命中仍可服务，新查询会被限流。
    pub fn health(&self) -> HealthStatus {
        let cache_stats = self.cache_stats();
        let available_tokens = self.limiter.remaining();

        let mut components = BTreeMap::new();
        components.insert("cache".to_string(), HealthLevel::Healthy);
        components.insert(
            "rate_limiter".to_string(),
            if available_tokens >= 1.0 {
                HealthLevel::Healthy
            } else {
                HealthLevel::Degraded
            },
        );

        let overall = if components.values().all(|&level| level == HealthLevel::Healthy) {
            HealthLevel::Healthy
        } else if components.values().any(|&level| level == HealthLevel::Unhealthy) {
            HealthLevel::Unhealthy
        } else {
            HealthLevel::Degraded
        };

        HealthStatus {
            overall,
            components,
            cache_size: cache_stats.size,
            cache_capacity: cache_stats.capacity,
            available_tokens,
            started_at: self.started_at,
            uptime_secs: (Utc::now() - self.started_at).num_seconds().max(0) as u64,
        }
    }

    pub fn config(&self) -> &DictConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<LookupCache> {
        &self.cache
    }

    pub fn limiter(&self) -> &Arc<TokenBucket> {
        &self.limiter
    }
}

/// 服务健康状态
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    /// 整体健康级别
    pub overall: HealthLevel,
    /// 各组件的健康状态
    pub components: BTreeMap<String, HealthLevel>,
    pub cache_size: usize,
    pub cache_capacity: usize,
    pub available_tokens: f64,
    pub started_at: DateTime<Utc>,
    pub uptime_secs: u64,
}

/// 健康状态级别
///
/// - `Healthy`: 组件运行正常
/// - `Degraded`: 部分功能受限，核心功能仍可用
/// - `Unhealthy`: 组件无法正常工作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthLevel {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.overall == HealthLevel::Healthy
    }
}
