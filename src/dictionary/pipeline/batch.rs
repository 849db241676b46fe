//! 批量查询编排模块
//!
//! 将一次批量查询拆分为去重后的查询组，依次经过缓存、限流器和获取器，
//! 最后按输入顺序重新组装结果。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio::time::Instant;

use super::normalize::validate_word;
use crate::dictionary::config::DictConfig;
use crate::dictionary::error::{DictError, DictResult};
use crate::dictionary::limiter::TokenBucket;
use crate::dictionary::responses::{
    BatchItem, BatchResponse, CachedJsonItem, LookupFailure, LookupResponse,
};
use crate::dictionary::storage::{CacheKey, LookupCache};
use crate::dictionary::types::{DictType, LookupPayload};
use crate::network::Fetcher;

/// 批量查询组
///
/// 一个规范化词对应输入中所有请求它的位置。每组每批最多一次上游调用。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchGroup {
    /// 规范化后的词
    pub word: String,
    /// 在输入中的位置，首个为首次出现
    pub positions: Vec<usize>,
}

impl BatchGroup {
    fn new(word: String, first_position: usize) -> Self {
        Self {
            word,
            positions: vec![first_position],
        }
    }
}

/// 编排器设置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSettings {
    pub max_batch_size: usize,
    pub max_word_length: usize,
    pub fetch_timeout: Duration,
    pub negative_ttl: Duration,
}

impl BatchSettings {
    pub fn from_config(config: &DictConfig) -> Self {
        Self {
            max_batch_size: config.batch_max_size,
            max_word_length: config.max_word_length,
            fetch_timeout: config.fetch_timeout(),
            negative_ttl: config.negative_cache_ttl(),
        }
    }
}

/// 缓存查找结果
enum CacheLookup {
    Raw(String),
    Decoded(LookupPayload),
    Miss,
}

/// 批量查询编排器
///
/// 组合缓存、限流器与获取器：
///
/// - **去重**: 规范化后相同的词只查询一次，结果分发给所有位置
/// - **缓存优先**: 命中的组不消耗令牌，也不访问上游
/// - **并发上限**: 所有上游调用共享同一个信号量
/// - **失败隔离**: 单个组失败不影响其他组
pub struct BatchOrchestrator {
    cache: Arc<LookupCache>,
    limiter: Arc<TokenBucket>,
    fetcher: Arc<dyn Fetcher>,
    semaphore: Arc<Semaphore>,
    settings: BatchSettings,
}

impl BatchOrchestrator {
    /// 创建编排器
    ///
    /// # 参数
    ///
    /// * `cache` - 共享查询缓存
    /// * `limiter` - 共享令牌桶
    /// * `fetcher` - 上游获取器
    /// * `semaphore` - 共享并发信号量，许可数即并发上限
    /// * `settings` - 批量大小、校验与超时设置
    pub fn new(
        cache: Arc<LookupCache>,
        limiter: Arc<TokenBucket>,
        fetcher: Arc<dyn Fetcher>,
        semaphore: Arc<Semaphore>,
        settings: BatchSettings,
    ) -> Self {
        Self {
            cache,
            limiter,
            fetcher,
            semaphore,
            settings,
        }
    }

    /// 执行批量查询并汇总
    ///
    /// 空批次或超过 `max_batch_size` 的批次整体拒绝，返回校验错误。
    pub async fn run(
        &self,
        words: &[String],
        dict_type: DictType,
        return_raw_cached: bool,
    ) -> DictResult<BatchResponse> {
        let start = Instant::now();
        let items = self.resolve(words, dict_type, return_raw_cached).await?;
        let latency = start.elapsed().as_secs_f64();

        let response = BatchResponse::from_items(dict_type, items, latency);
        tracing::info!(
            "批量查询完成: count={}, success={}, fail={}, latency={:.3}s",
            response.count,
            response.success_count,
            response.fail_count,
            latency
        );
        Ok(response)
    }

    /// 解析一批查询词，结果与输入等长且顺序一致
    ///
    /// # 处理流程
    ///
    /// 1. 规范化并校验每个词，按首次出现顺序分组
    /// 2. 逐组查缓存；未命中的组各取一个令牌（不等待）
    /// 3. 在并发上限内并发获取，成功结果写入缓存
    /// 4. 把每组结果分发回原始位置
    pub async fn resolve(
        &self,
        words: &[String],
        dict_type: DictType,
        return_raw_cached: bool,
    ) -> DictResult<Vec<BatchItem>> {
        if words.is_empty() {
            return Err(DictError::Validation("批量查询至少需要一个词".to_string()));
        }
        if words.len() > self.settings.max_batch_size {
            return Err(DictError::Validation(format!(
                "批量查询最多 {} 个词，实际 {} 个",
                self.settings.max_batch_size,
                words.len()
            )));
        }

        let mut slots: Vec<Option<BatchItem>> = vec![None; words.len()];
        let groups = self.group_words(words, &mut slots);
        tracing::debug!(
            "批量查询分组: 输入 {} 个词，去重后 {} 组",
            words.len(),
            groups.len()
        );

        let mut pending = Vec::new();
        for group in &groups {
            let key = CacheKey::new(group.word.clone(), dict_type);
            match self.lookup_cache(&key, return_raw_cached) {
                CacheLookup::Raw(cached_json) => {
                    for (rank, &position) in group.positions.iter().enumerate() {
                        slots[position] = Some(BatchItem::Cached(CachedJsonItem::new(
                            &group.word,
                            cached_json.clone(),
                            rank > 0,
                        )));
                    }
                    continue;
                }
                CacheLookup::Decoded(payload) => {
                    Self::fan_out(&mut slots, group, Ok(&payload), true);
                    continue;
                }
                CacheLookup::Miss => {}
            }

            if self.limiter.try_acquire(1.0) {
                pending.push(group);
            } else {
                let error = DictError::RateLimitExceeded(format!(
                    "'{}' 未能获得令牌，请稍后重试",
                    group.word
                ));
                Self::fan_out(&mut slots, group, Err(&error), false);
            }
        }

        let fetched = join_all(
            pending
                .iter()
                .map(|group| self.fetch_and_cache(&group.word, dict_type)),
        )
        .await;

        for (group, result) in pending.into_iter().zip(fetched) {
            match &result {
                Ok(payload) => Self::fan_out(&mut slots, group, Ok(payload), false),
                Err(error) => {
                    tracing::warn!("批量查询子项失败: word='{}', error={}", group.word, error);
                    Self::fan_out(&mut slots, group, Err(error), false);
                }
            }
        }

        Ok(words
            .iter()
            .zip(slots)
            .map(|(raw, slot)| {
                slot.unwrap_or_else(|| {
                    let error = DictError::Unknown("查询结果缺失".to_string());
                    BatchItem::Failed(LookupFailure::from_error(raw, raw, &error, false, None))
                })
            })
            .collect())
    }

    /// 在共享并发上限内获取，成功后写入缓存
    ///
    /// 单词查询和批量查询都走这里。超过 `fetch_timeout` 视为超时。
    pub async fn fetch_and_cache(
        &self,
        word: &str,
        dict_type: DictType,
    ) -> DictResult<LookupPayload> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| DictError::Unknown("并发信号量已关闭".to_string()))?;

        let payload = tokio::time::timeout(
            self.settings.fetch_timeout,
            self.fetcher.fetch(word, dict_type),
        )
        .await
        .map_err(|_| {
            DictError::UpstreamTimeout(format!(
                "查询 '{}' 超过 {}s 未完成",
                word,
                self.settings.fetch_timeout.as_secs_f64()
            ))
        })??;

        self.store(word, dict_type, &payload);
        Ok(payload)
    }

    /// 查缓存并解码；解码失败按未命中处理
    pub fn cached_payload(&self, key: &CacheKey) -> Option<LookupPayload> {
        match self.lookup_cache(key, false) {
            CacheLookup::Decoded(payload) => Some(payload),
            _ => None,
        }
    }

    fn lookup_cache(&self, key: &CacheKey, return_raw: bool) -> CacheLookup {
        let Some(cached) = self.cache.get(key) else {
            return CacheLookup::Miss;
        };

        if return_raw {
            return CacheLookup::Raw(cached);
        }

        match serde_json::from_str::<LookupPayload>(&cached) {
            Ok(payload) => CacheLookup::Decoded(payload),
            Err(e) => {
                tracing::warn!("缓存内容无法解码，按未命中处理: word='{}', {}", key.word, e);
                CacheLookup::Miss
            }
        }
    }

    fn store(&self, word: &str, dict_type: DictType, payload: &LookupPayload) {
        let serialized = match serde_json::to_string(payload) {
            Ok(serialized) => serialized,
            Err(e) => {
                tracing::warn!("序列化查询结果失败，跳过缓存: {}", e);
                return;
            }
        };

        let key = CacheKey::new(word, dict_type);
        if payload.is_not_found() {
            self.cache
                .set_with_ttl(&key, serialized, self.settings.negative_ttl);
        } else {
            self.cache.set(&key, serialized);
        }
    }

    /// 规范化、校验并分组；校验失败的词直接写入结果槽位
    fn group_words(&self, words: &[String], slots: &mut [Option<BatchItem>]) -> Vec<BatchGroup> {
        let mut groups: Vec<BatchGroup> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for (position, raw) in words.iter().enumerate() {
            let normalized = self.fetcher.normalize(raw);

            if let Err(error) = validate_word(&normalized, self.settings.max_word_length) {
                slots[position] = Some(BatchItem::Failed(LookupFailure::from_error(
                    raw.trim(),
                    &normalized,
                    &error,
                    false,
                    None,
                )));
                continue;
            }

            match index.get(&normalized) {
                Some(&group) => groups[group].positions.push(position),
                None => {
                    index.insert(normalized.clone(), groups.len());
                    groups.push(BatchGroup::new(normalized, position));
                }
            }
        }

        groups
    }

    /// 把组结果分发到所有位置，首次出现之后的位置标记为 deduped
    fn fan_out(
        slots: &mut [Option<BatchItem>],
        group: &BatchGroup,
        result: Result<&LookupPayload, &DictError>,
        from_cache: bool,
    ) {
        for (rank, &position) in group.positions.iter().enumerate() {
            let deduped = rank > 0;
            let item = match result {
                Ok(payload) => BatchItem::Found(LookupResponse::from_payload(
                    &group.word,
                    payload,
                    from_cache,
                    deduped,
                    None,
                )),
                Err(error) => BatchItem::Failed(LookupFailure::from_error(
                    &group.word,
                    &group.word,
                    error,
                    deduped,
                    None,
                )),
            };
            slots[position] = Some(item);
        }
    }
}
