//! 运行指标收集
//!
//! 按端点与错误类别计数，维护有界的延迟采样窗口（总体与按端点），
//! 并把每次记录同步到 `metrics` 门面，已安装的导出器可以看到相同的数据。

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;

use crate::dictionary::config::constants::MAX_LATENCY_SAMPLES;
use crate::dictionary::error::ErrorKind;
use crate::dictionary::limiter::LimiterStats;
use crate::dictionary::storage::CacheStats;

/// 请求结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    pub fn from_success(success: bool) -> Self {
        if success {
            Outcome::Success
        } else {
            Outcome::Failure
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failure => "failure",
        }
    }
}

/// 单个端点的请求计数
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EndpointCounts {
    pub total: u64,
    pub success: u64,
    pub failure: u64,
}

/// 延迟百分位（秒）
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct LatencyPercentiles {
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
}

/// 单个端点的延迟摘要（秒）
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct LatencySummary {
    pub count: usize,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
}

/// 只读指标快照
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub success_rate: f64,
    pub cache_hit_rate: f64,
    pub average_latency: f64,
    pub request_counts_by_endpoint: BTreeMap<String, EndpointCounts>,
    pub error_counts_by_kind: BTreeMap<String, u64>,
    pub latency_percentiles: LatencyPercentiles,
    pub endpoint_stats: BTreeMap<String, LatencySummary>,
    pub cache_stats: CacheStats,
    pub rate_limiter_stats: LimiterStats,
    pub collected_since: DateTime<Utc>,
}

/// 有界延迟窗口，只保留最近的样本
#[derive(Debug, Default)]
struct LatencyWindow {
    samples: VecDeque<f64>,
}

impl LatencyWindow {
    fn push(&mut self, seconds: f64) {
        if self.samples.len() >= MAX_LATENCY_SAMPLES {
            self.samples.pop_front();
        }
        self.samples.push_back(seconds);
    }

    fn sorted(&self) -> Vec<f64> {
        let mut sorted: Vec<f64> = self.samples.iter().copied().collect();
        sorted.sort_by(f64::total_cmp);
        sorted
    }

    fn percentiles(&self) -> LatencyPercentiles {
        let sorted = self.sorted();
        LatencyPercentiles {
            p50: nearest_rank(&sorted, 50.0),
            p95: nearest_rank(&sorted, 95.0),
            p99: nearest_rank(&sorted, 99.0),
        }
    }

    fn summary(&self) -> LatencySummary {
        let sorted = self.sorted();
        if sorted.is_empty() {
            return LatencySummary::default();
        }

        let count = sorted.len();
        LatencySummary {
            count,
            avg: sorted.iter().sum::<f64>() / count as f64,
            min: sorted[0],
            max: sorted[count - 1],
            p50: nearest_rank(&sorted, 50.0),
            p95: nearest_rank(&sorted, 95.0),
            p99: nearest_rank(&sorted, 99.0),
        }
    }
}

/// 最近秩百分位：`rank = ceil(p/100 * n)`，取 `sorted[rank-1]`
pub fn nearest_rank(sorted: &[f64], percentile: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }

    let n = sorted.len();
    let rank = (percentile / 100.0 * n as f64).ceil() as usize;
    sorted[rank.clamp(1, n) - 1]
}

/// 指标收集器
pub struct MetricsCollector {
    total_requests: AtomicU64,
    successful_requests: AtomicU64,
    failed_requests: AtomicU64,
    total_latency_micros: AtomicU64,
    endpoint_counts: DashMap<String, EndpointCounts>,
    error_counts: DashMap<ErrorKind, u64>,
    latencies: Mutex<LatencyWindow>,
    endpoint_latencies: DashMap<String, LatencyWindow>,
    collected_since: Mutex<DateTime<Utc>>,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            successful_requests: AtomicU64::new(0),
            failed_requests: AtomicU64::new(0),
            total_latency_micros: AtomicU64::new(0),
            endpoint_counts: DashMap::new(),
            error_counts: DashMap::new(),
            latencies: Mutex::new(LatencyWindow::default()),
            endpoint_latencies: DashMap::new(),
            collected_since: Mutex::new(Utc::now()),
        }
    }

    /// 记录一次已完成的操作
    pub fn record(
        &self,
        endpoint: &str,
        outcome: Outcome,
        latency: Duration,
        error_kind: Option<ErrorKind>,
    ) {
        let seconds = latency.as_secs_f64();

        self.total_requests.fetch_add(1, Ordering::Relaxed);
        match outcome {
            Outcome::Success => self.successful_requests.fetch_add(1, Ordering::Relaxed),
            Outcome::Failure => self.failed_requests.fetch_add(1, Ordering::Relaxed),
        };
        self.total_latency_micros
            .fetch_add(latency.as_micros() as u64, Ordering::Relaxed);

        {
            let mut counts = self.endpoint_counts.entry(endpoint.to_string()).or_default();
            counts.total += 1;
            match outcome {
                Outcome::Success => counts.success += 1,
                Outcome::Failure => counts.failure += 1,
            }
        }

        match self.latencies.lock() {
            Ok(mut window) => window.push(seconds),
            Err(_) => tracing::warn!("延迟窗口锁中毒，跳过本次采样"),
        }
        self.endpoint_latencies
            .entry(endpoint.to_string())
            .or_default()
            .push(seconds);

        if let Some(kind) = error_kind {
            self.record_error(kind);
        }

        metrics::counter!(
            "naver_dict_requests_total",
            "endpoint" => endpoint.to_string(),
            "outcome" => outcome.as_str()
        )
        .increment(1);
        metrics::histogram!(
            "naver_dict_request_latency_seconds",
            "endpoint" => endpoint.to_string()
        )
        .record(seconds);

        tracing::debug!(
            "记录请求: endpoint={}, outcome={}, latency={:.3}s",
            endpoint,
            outcome.as_str(),
            seconds
        );
    }

    /// 按类别记录错误
    pub fn record_error(&self, kind: ErrorKind) {
        *self.error_counts.entry(kind).or_insert(0) += 1;
        metrics::counter!("naver_dict_errors_total", "kind" => kind.as_str()).increment(1);
        tracing::debug!("记录错误: type={}", kind);
    }

    /// 生成只读快照
    pub fn snapshot(&self, cache_stats: CacheStats, limiter_stats: LimiterStats) -> MetricsSnapshot {
        let total_requests = self.total_requests.load(Ordering::Relaxed);
        let successful_requests = self.successful_requests.load(Ordering::Relaxed);
        let failed_requests = self.failed_requests.load(Ordering::Relaxed);
        let total_latency =
            self.total_latency_micros.load(Ordering::Relaxed) as f64 / 1_000_000.0;

        let ratio = |part: u64, whole: u64| {
            if whole == 0 {
                0.0
            } else {
                part as f64 / whole as f64
            }
        };

        let latency_percentiles = match self.latencies.lock() {
            Ok(window) => window.percentiles(),
            Err(_) => LatencyPercentiles::default(),
        };

        let request_counts_by_endpoint = self
            .endpoint_counts
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        let error_counts_by_kind = self
            .error_counts
            .iter()
            .map(|entry| (entry.key().as_str().to_string(), *entry.value()))
            .collect();
        let endpoint_stats = self
            .endpoint_latencies
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().summary()))
            .collect();

        let collected_since = self
            .collected_since
            .lock()
            .map(|since| *since)
            .unwrap_or_else(|_| Utc::now());

        MetricsSnapshot {
            total_requests,
            successful_requests,
            failed_requests,
            success_rate: ratio(successful_requests, total_requests),
            cache_hit_rate: cache_stats.hit_rate(),
            average_latency: if total_requests == 0 {
                0.0
            } else {
                total_latency / total_requests as f64
            },
            request_counts_by_endpoint,
            error_counts_by_kind,
            latency_percentiles,
            endpoint_stats,
            cache_stats,
            rate_limiter_stats: limiter_stats,
            collected_since,
        }
    }

    /// 清空全部计数与采样
    pub fn reset(&self) {
        self.total_requests.store(0, Ordering::Relaxed);
        self.successful_requests.store(0, Ordering::Relaxed);
        self.failed_requests.store(0, Ordering::Relaxed);
        self.total_latency_micros.store(0, Ordering::Relaxed);
        self.endpoint_counts.clear();
        self.error_counts.clear();
        self.endpoint_latencies.clear();

        if let Ok(mut window) = self.latencies.lock() {
            window.samples.clear();
        }
        if let Ok(mut since) = self.collected_since.lock() {
            *since = Utc::now();
        }

        tracing::info!("重置指标统计");
    }
}
