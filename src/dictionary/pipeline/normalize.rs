//! 查询词规范化与校验

use crate::dictionary::error::{DictError, DictResult};

/// 规范化查询词：去除首尾空白、合并内部空白、统一小写
pub fn normalize_word(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// 校验规范化后的查询词
pub fn validate_word(normalized: &str, max_length: usize) -> DictResult<()> {
    if normalized.is_empty() {
        return Err(DictError::Validation("搜索词不能为空".to_string()));
    }

    let length = normalized.chars().count();
    if length > max_length {
        return Err(DictError::Validation(format!(
            "搜索词过长: {} 个字符，最多 {} 个字符",
            length, max_length
        )));
    }

    Ok(())
}
