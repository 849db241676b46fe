//! 响应模型
//!
//! 单查与批查子项共用同一组字段，调用方可以用同一套逻辑消费。

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dictionary::error::{DictError, ErrorKind};
use crate::dictionary::types::{DictType, LookupPayload};

/// 查询成功
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupResponse {
    pub success: bool,
    pub word: String,
    pub count: usize,
    pub results: Vec<Value>,
    pub from_cache: bool,
    pub deduped: bool,
    pub source_word: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dict_type: Option<DictType>,
}

/// 查询失败
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupFailure {
    pub success: bool,
    pub word: String,
    pub error: String,
    pub error_type: ErrorKind,
    pub details: String,
    pub from_cache: bool,
    pub deduped: bool,
    pub source_word: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dict_type: Option<DictType>,
}

/// 缓存命中且直接返回缓存原文
///
/// 不解码缓存内容，`cached_json` 由调用方自行解析。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedJsonItem {
    pub success: bool,
    pub word: String,
    pub from_cache: bool,
    pub cached_json: String,
    pub deduped: bool,
    pub source_word: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dict_type: Option<DictType>,
}

/// 批量查询子项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchItem {
    Found(LookupResponse),
    Cached(CachedJsonItem),
    Failed(LookupFailure),
}

/// 批量查询顶层响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub success: bool,
    pub partial_success: bool,
    pub count: usize,
    pub success_count: usize,
    pub fail_count: usize,
    pub dict_type: DictType,
    pub results: Vec<BatchItem>,
    /// 耗时（秒）
    pub latency: f64,
}

impl LookupResponse {
    pub fn from_payload(
        word: &str,
        payload: &LookupPayload,
        from_cache: bool,
        deduped: bool,
        dict_type: Option<DictType>,
    ) -> Self {
        Self {
            success: true,
            word: word.to_string(),
            count: payload.len(),
            results: payload.entries.clone(),
            from_cache,
            deduped,
            source_word: word.to_string(),
            dict_type,
        }
    }
}

impl LookupFailure {
    pub fn from_error(
        word: &str,
        source_word: &str,
        error: &DictError,
        deduped: bool,
        dict_type: Option<DictType>,
    ) -> Self {
        Self {
            success: false,
            word: word.to_string(),
            error: error.to_string(),
            error_type: error.kind(),
            details: error.details(),
            from_cache: false,
            deduped,
            source_word: source_word.to_string(),
            dict_type,
        }
    }
}

impl CachedJsonItem {
    pub fn new(word: &str, cached_json: String, deduped: bool) -> Self {
        Self {
            success: true,
            word: word.to_string(),
            from_cache: true,
            cached_json,
            deduped,
            source_word: word.to_string(),
            dict_type: None,
        }
    }
}

impl BatchItem {
    pub fn is_success(&self) -> bool {
        match self {
            BatchItem::Found(item) => item.success,
            BatchItem::Cached(item) => item.success,
            BatchItem::Failed(_) => false,
        }
    }

    pub fn word(&self) -> &str {
        match self {
            BatchItem::Found(item) => &item.word,
            BatchItem::Cached(item) => &item.word,
            BatchItem::Failed(item) => &item.word,
        }
    }

    pub fn is_deduped(&self) -> bool {
        match self {
            BatchItem::Found(item) => item.deduped,
            BatchItem::Cached(item) => item.deduped,
            BatchItem::Failed(item) => item.deduped,
        }
    }

    pub fn from_cache(&self) -> bool {
        match self {
            BatchItem::Found(item) => item.from_cache,
            BatchItem::Cached(item) => item.from_cache,
            BatchItem::Failed(item) => item.from_cache,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            BatchItem::Failed(item) => Some(item.error_type),
            _ => None,
        }
    }
}

impl BatchResponse {
    /// 汇总子项结果
    pub fn from_items(dict_type: DictType, results: Vec<BatchItem>, latency: f64) -> Self {
        let count = results.len();
        let success_count = results.iter().filter(|item| item.is_success()).count();

        Self {
            success: success_count == count,
            partial_success: success_count > 0 && success_count < count,
            count,
            success_count,
            fail_count: count - success_count,
            dict_type,
            results,
            latency,
        }
    }
}

/// 统一的 JSON 输出格式（保持中文可读）
pub fn to_pretty_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        format!(
            "{{\"success\": false, \"error\": \"序列化响应失败\", \"details\": \"{}\"}}",
            e.to_string().replace('"', "'")
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_item_fields() {
        let payload = LookupPayload::new(vec![json!({"expEntry": "학교"})]);
        let item = LookupResponse::from_payload("학교", &payload, true, false, Some(DictType::KoZh));
        let value = serde_json::to_value(&item).unwrap();

        assert_eq!(value["success"], true);
        assert_eq!(value["count"], 1);
        assert_eq!(value["from_cache"], true);
        assert_eq!(value["source_word"], "학교");
        assert_eq!(value["dict_type"], "ko-zh");
    }

    #[test]
    fn test_failure_item_fields() {
        let error = DictError::Validation("搜索词不能为空".into());
        let item = LookupFailure::from_error("", "", &error, false, None);
        let value = serde_json::to_value(&item).unwrap();

        assert_eq!(value["success"], false);
        assert_eq!(value["error_type"], "validation");
        assert_eq!(value["details"], "搜索词不能为空");
        assert!(value.get("dict_type").is_none());
    }

    #[test]
    fn test_batch_aggregation() {
        let payload = LookupPayload::default();
        let ok = BatchItem::Found(LookupResponse::from_payload("a", &payload, false, false, None));
        let failed = BatchItem::Failed(LookupFailure::from_error(
            "b",
            "b",
            &DictError::RateLimitExceeded("empty".into()),
            false,
            None,
        ));

        let response = BatchResponse::from_items(DictType::KoZh, vec![ok.clone(), failed], 0.1);
        assert!(!response.success);
        assert!(response.partial_success);
        assert_eq!(response.success_count, 1);
        assert_eq!(response.fail_count, 1);

        let response = BatchResponse::from_items(DictType::KoEn, vec![ok], 0.1);
        assert!(response.success);
        assert!(!response.partial_success);
    }

    #[test]
    fn test_untagged_items_serialize_flat() {
        let item = BatchItem::Cached(CachedJsonItem::new("a", "{\"entries\":[]}".into(), true));
        let value = serde_json::to_value(&item).unwrap();

        assert_eq!(value["cached_json"], "{\"entries\":[]}");
        assert_eq!(value["deduped"], true);
        assert!(value.get("results").is_none());
    }
}
