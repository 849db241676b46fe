//! Naver 词典获取器
//!
//! 请求 `GET {base}/{code}/search`，只负责定位原始词条列表
//! (`searchResultMap.searchResultListMap.WORD.items`)，不解释词条内容。

use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, REFERER, RETRY_AFTER, USER_AGENT};
use serde_json::Value;

use super::Fetcher;
use crate::dictionary::config::{constants, DictConfig};
use crate::dictionary::error::{DictError, DictResult};
use crate::dictionary::types::{DictType, LookupPayload};

/// 重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &DictConfig) -> Self {
        Self {
            max_attempts: config.retry_max_attempts.max(1),
            base_delay: config.retry_base_delay(),
            max_delay: config.retry_max_delay(),
        }
    }

    /// 第 `attempt` 次失败后的等待时间，上游给出 Retry-After 时优先使用
    pub fn delay_for(&self, attempt: u32, error: &DictError) -> Duration {
        error
            .retry_after()
            .unwrap_or_else(|| backoff_delay(self.base_delay, self.max_delay, attempt))
    }
}

/// 指数退避：`base * 2^(attempt-1)`，不超过 `max`
pub fn backoff_delay(base: Duration, max: Duration, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(31);
    base.saturating_mul(1u32 << exponent).min(max)
}

/// 按 HTTP 状态码分类，2xx 返回 Ok
pub fn classify_status(status: u16, retry_after: Option<Duration>, message: String) -> DictResult<()> {
    match status {
        200..=299 => Ok(()),
        429 => Err(DictError::UpstreamRateLimit {
            retry_after,
            message,
        }),
        500..=599 => Err(DictError::UpstreamServer { status, message }),
        _ => Err(DictError::UpstreamHttp { status, message }),
    }
}

/// 从上游响应中取出 `WORD` 段的原始词条
///
/// 缺少 `searchResultListMap` 视为解析错误；缺少 `WORD` 段视为未找到。
pub fn extract_word_items(body: &Value) -> DictResult<LookupPayload> {
    let list_map = body
        .pointer("/searchResultMap/searchResultListMap")
        .and_then(Value::as_object)
        .ok_or_else(|| {
            DictError::UpstreamParse("响应缺少 searchResultMap.searchResultListMap".to_string())
        })?;

    let entries = list_map
        .get("WORD")
        .and_then(|section| section.get("items"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    Ok(LookupPayload::new(entries))
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Naver 词典获取器
pub struct NaverFetcher {
    client: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl NaverFetcher {
    pub fn new(config: &DictConfig) -> DictResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| DictError::Config(format!("User-Agent 无效: {}", e)))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json,*/*"));
        headers.insert(REFERER, HeaderValue::from_static(constants::DEFAULT_REFERER));

        let client = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| DictError::Config(format!("创建HTTP客户端失败: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retry: RetryPolicy::from_config(config),
        })
    }

    /// 查询接口地址
    pub fn search_url(&self, dict_type: DictType) -> String {
        let (code, _) = dict_type.upstream_code();
        format!("{}/{}/search", self.base_url, code)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    async fn fetch_once(&self, word: &str, dict_type: DictType) -> DictResult<LookupPayload> {
        let (_, lang) = dict_type.upstream_code();
        let url = self.search_url(dict_type);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("query", word),
                ("m", "mobile"),
                ("lang", lang),
                ("shouldSearchVlive", "true"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = parse_retry_after(response.headers());
            let message = status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string();
            classify_status(status.as_u16(), retry_after, message)?;
        }

        let body: Value = response.json().await?;
        extract_word_items(&body)
    }

    async fn fetch_with_retry(&self, word: &str, dict_type: DictType) -> DictResult<LookupPayload> {
        let mut attempt = 1;
        loop {
            match self.fetch_once(word, dict_type).await {
                Ok(payload) => {
                    tracing::debug!(
                        "上游查询成功: word='{}', dict_type={}, entries={}",
                        word,
                        dict_type,
                        payload.len()
                    );
                    return Ok(payload);
                }
                Err(error) if error.is_retryable() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay_for(attempt, &error);
                    tracing::warn!(
                        "上游请求失败，{:?} 后进行第 {} 次重试: {}",
                        delay,
                        attempt + 1,
                        error
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

impl Fetcher for NaverFetcher {
    fn fetch<'a>(
        &'a self,
        word: &'a str,
        dict_type: DictType,
    ) -> BoxFuture<'a, DictResult<LookupPayload>> {
        Box::pin(self.fetch_with_retry(word, dict_type))
    }
}
