//! Web 模块的数据类型定义

use std::sync::Arc;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::dictionary::{DictError, DictResult, DictType, DictionaryService, ErrorKind};

/// 应用状态
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<DictionaryService>,
}

/// 单词查询请求
#[derive(Debug, Deserialize)]
pub struct SearchWordRequest {
    pub word: String,
    #[serde(default)]
    pub dict_type: Option<String>,
}

/// 批量查询请求
#[derive(Debug, Deserialize)]
pub struct BatchSearchRequest {
    pub words: Vec<String>,
    #[serde(default)]
    pub dict_type: Option<String>,
    #[serde(default)]
    pub return_cached_json: bool,
}

/// 整体失败响应（批量查询被整体拒绝时使用）
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub error_type: ErrorKind,
    pub details: String,
}

/// 缓存清理响应
#[derive(Debug, Serialize)]
pub struct CacheClearResponse {
    pub success: bool,
    pub cleared: usize,
    pub message: String,
}

/// 维护操作响应
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl ErrorResponse {
    pub fn from_error(error: &DictError) -> Self {
        Self {
            success: false,
            error: error.to_string(),
            error_type: error.kind(),
            details: error.details(),
        }
    }
}

/// 解析可选的词典类型，缺省为 ko-zh
pub fn parse_dict_type(value: Option<&str>) -> DictResult<DictType> {
    match value {
        Some(value) => value.parse(),
        None => Ok(DictType::default()),
    }
}

/// 错误类别到 HTTP 状态码
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::RateLimit | ErrorKind::UpstreamRateLimit => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::HttpError
        | ErrorKind::UpstreamServerError
        | ErrorKind::NetworkError
        | ErrorKind::ParseError => StatusCode::BAD_GATEWAY,
        ErrorKind::Config | ErrorKind::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(ErrorKind::Validation), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::RateLimit), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(status_for(ErrorKind::Timeout), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(status_for(ErrorKind::ParseError), StatusCode::BAD_GATEWAY);
        assert_eq!(status_for(ErrorKind::Unknown), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_parse_dict_type() {
        assert_eq!(parse_dict_type(None).unwrap(), DictType::KoZh);
        assert_eq!(parse_dict_type(Some("ko-en")).unwrap(), DictType::KoEn);
        assert!(parse_dict_type(Some("fr")).is_err());
    }
}
