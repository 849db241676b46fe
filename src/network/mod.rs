//! # 网络模块
//!
//! 上游词典访问的抽象与实现：
//!
//! - `Fetcher` - 核心层依赖的获取器接口（查询 + 规范化约定）
//! - `naver` - 基于 reqwest 的 Naver 词典获取器，含状态分类与重试

pub mod naver;

use futures::future::BoxFuture;

use crate::dictionary::error::DictResult;
use crate::dictionary::pipeline::normalize_word;
use crate::dictionary::types::{DictType, LookupPayload};

pub use naver::{backoff_delay, classify_status, extract_word_items, NaverFetcher, RetryPolicy};

/// 上游获取器
///
/// 传入的词已经过 [`normalize`](Fetcher::normalize) 规范化。实现负责把上游失败
/// 归类为对应的 `DictError` 变体，自身的重试也在这里完成。
pub trait Fetcher: Send + Sync {
    fn fetch<'a>(
        &'a self,
        word: &'a str,
        dict_type: DictType,
    ) -> BoxFuture<'a, DictResult<LookupPayload>>;

    /// 规范化约定，缓存键与批量去重都基于它
    fn normalize(&self, raw: &str) -> String {
        normalize_word(raw)
    }
}
