//! 查询结果缓存模块
//!
//! 基于 `lru` 的 TTL + LRU 缓存，键为（规范化词语，词典类型）的 blake3 摘要。
//!
//! 淘汰策略：
//! - 仅成功的 `get` 会刷新最近使用顺序，覆盖写入已存在的键不刷新；
//! - 每次访问先检查 TTL 再做 LRU 记账，过期条目永远不会被返回；
//! - 缓存已满且插入新键时，先淘汰最久未使用的条目。
//!
//! 统计口径：容量淘汰一律计入 `evictions`；被淘汰的条目若已过期，同时计入 `expirations`。

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use lru::LruCache;
use serde::Serialize;
use tokio::time::Instant;

use crate::dictionary::types::DictType;

// ============================================================================
// 核心类型
// ============================================================================

/// 缓存键摘要
pub type CacheDigest = [u8; 32];

/// 缓存键
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub word: String,
    pub dict_type: DictType,
}

/// 缓存条目
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: String,
    pub created_at: Instant,
    pub expires_at: Instant,
}

/// 缓存统计信息
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub default_ttl_secs: u64,
    /// 容量利用率（size / capacity）
    pub utilization: f64,
}

/// 查询结果缓存
pub struct LookupCache {
    entries: Mutex<LruCache<CacheDigest, CacheEntry>>,
    capacity: usize,
    default_ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

// ============================================================================
// 实现
// ============================================================================

impl CacheKey {
    pub fn new(word: impl Into<String>, dict_type: DictType) -> Self {
        Self {
            word: word.into(),
            dict_type,
        }
    }

    /// 生成缓存键摘要
    pub fn digest(&self) -> CacheDigest {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.word.as_bytes());
        hasher.update(b"|");
        hasher.update(self.dict_type.as_str().as_bytes());
        *hasher.finalize().as_bytes()
    }
}

impl CacheEntry {
    fn new(value: String, now: Instant, ttl: Duration) -> Self {
        let expires_at = now
            .checked_add(ttl)
            .unwrap_or_else(|| now + Duration::from_secs(u32::MAX as u64));
        Self {
            value,
            created_at: now,
            expires_at,
        }
    }

    /// 检查条目是否过期
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

impl LookupCache {
    /// 创建缓存，容量为0时按1处理（配置层会提前拒绝0）
    pub fn new(capacity: usize, default_ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        tracing::debug!(
            "初始化缓存: capacity={}, ttl={}s",
            capacity,
            default_ttl.as_secs()
        );

        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            capacity: capacity.get(),
            default_ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
        }
    }

    /// 获取缓存值，仅在存在且未过期时返回
    pub fn get(&self, key: &CacheKey) -> Option<String> {
        let digest = key.digest();
        let now = Instant::now();
        let mut entries = self.lock();

        let expired = match entries.peek(&digest) {
            Some(entry) => entry.is_expired(now),
            None => {
                drop(entries);
                self.record_miss(key);
                return None;
            }
        };

        if expired {
            entries.pop(&digest);
            drop(entries);
            self.expirations.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("缓存过期: word='{}', dict_type={}", key.word, key.dict_type);
            self.record_miss(key);
            return None;
        }

        // 命中后提升为最近使用
        let value = entries.get(&digest).map(|entry| entry.value.clone());
        drop(entries);

        self.hits.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("naver_dict_cache_hits_total").increment(1);
        tracing::debug!("缓存命中: word='{}', dict_type={}", key.word, key.dict_type);
        value
    }

    /// 使用默认TTL写入
    pub fn set(&self, key: &CacheKey, value: String) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    /// 使用指定TTL写入（负缓存使用较短TTL）
    pub fn set_with_ttl(&self, key: &CacheKey, value: String, ttl: Duration) {
        let digest = key.digest();
        let now = Instant::now();
        let entry = CacheEntry::new(value, now, ttl);
        let mut entries = self.lock();

        if let Some(existing) = entries.peek_mut(&digest) {
            // 覆盖写入不改变最近使用顺序
            *existing = entry;
            return;
        }

        if entries.len() >= self.capacity {
            if let Some((_, victim)) = entries.pop_lru() {
                self.evictions.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("naver_dict_cache_evictions_total").increment(1);
                if victim.is_expired(now) {
                    self.expirations.fetch_add(1, Ordering::Relaxed);
                }
                tracing::debug!("LRU 淘汰缓存项");
            }
        }

        entries.put(digest, entry);
        tracing::debug!(
            "已缓存: word='{}', dict_type={}, ttl={}s, 当前大小={}",
            key.word,
            key.dict_type,
            ttl.as_secs(),
            entries.len()
        );
    }

    /// 清空缓存，返回删除的条目数
    pub fn clear(&self) -> usize {
        let mut entries = self.lock();
        let count = entries.len();
        entries.clear();
        drop(entries);

        tracing::info!("清空缓存: 已删除 {} 项", count);
        count
    }

    /// 清理过期条目，返回删除的条目数
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.lock();

        let expired: Vec<CacheDigest> = entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(digest, _)| *digest)
            .collect();

        for digest in &expired {
            entries.pop(digest);
        }

        self.expirations
            .fetch_add(expired.len() as u64, Ordering::Relaxed);
        if !expired.is_empty() {
            tracing::debug!("清理过期缓存: {} 项", expired.len());
        }
        expired.len()
    }

    /// 获取统计信息
    pub fn stats(&self) -> CacheStats {
        let size = self.len();
        CacheStats {
            size,
            capacity: self.capacity,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            default_ttl_secs: self.default_ttl.as_secs(),
            utilization: size as f64 / self.capacity as f64,
        }
    }

    /// 重置命中统计（不影响缓存内容）
    pub fn reset_stats(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
        self.expirations.store(0, Ordering::Relaxed);
    }

    /// 当前条目数（包含尚未被惰性清理的过期条目）
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn record_miss(&self, key: &CacheKey) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("naver_dict_cache_misses_total").increment(1);
        tracing::debug!("缓存未命中: word='{}', dict_type={}", key.word, key.dict_type);
    }

    /// 获取锁；锁中毒时清空缓存继续服务，相当于一次未命中
    fn lock(&self) -> MutexGuard<'_, LruCache<CacheDigest, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("缓存锁中毒，清空缓存后继续服务");
            let mut guard = poisoned.into_inner();
            guard.clear();
            self.entries.clear_poison();
            guard
        })
    }
}

impl CacheStats {
    /// 计算缓存命中率
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
