//! 词典领域类型

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dictionary::error::DictError;

/// 词典类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DictType {
    /// 韩中词典
    #[default]
    #[serde(rename = "ko-zh")]
    KoZh,
    /// 韩英词典
    #[serde(rename = "ko-en")]
    KoEn,
}

impl DictType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DictType::KoZh => "ko-zh",
            DictType::KoEn => "ko-en",
        }
    }

    /// 上游使用的词典代码与语言参数
    pub fn upstream_code(&self) -> (&'static str, &'static str) {
        match self {
            DictType::KoZh => ("kozh", "zh_CN"),
            DictType::KoEn => ("koen", "en"),
        }
    }
}

impl fmt::Display for DictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DictType {
    type Err = DictError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ko-zh" | "kozh" => Ok(DictType::KoZh),
            "ko-en" | "koen" => Ok(DictType::KoEn),
            other => Err(DictError::Validation(format!(
                "不支持的词典类型 '{}'，可选: ko-zh, ko-en",
                other
            ))),
        }
    }
}

/// 一次上游查询的结构化结果
///
/// `entries` 保留上游返回的原始词条，核心层不解释其内容。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LookupPayload {
    pub entries: Vec<serde_json::Value>,
}

impl LookupPayload {
    pub fn new(entries: Vec<serde_json::Value>) -> Self {
        Self { entries }
    }

    /// 未找到任何词条（走负缓存）
    pub fn is_not_found(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
