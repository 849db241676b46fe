//! 存储模块
//!
//! 提供查询结果的进程内缓存。

pub mod cache;

pub use cache::{CacheDigest, CacheEntry, CacheKey, CacheStats, LookupCache};
