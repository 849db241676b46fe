//! 词典模块统一错误处理
//!
//! 提供结构化错误类型、机器可读的错误类别以及错误处理辅助函数

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::env::EnvError;

/// 词典查询错误类型
#[derive(Error, Debug, Clone)]
pub enum DictError {
    /// 输入验证错误
    #[error("输入验证失败: {0}")]
    Validation(String),

    /// 本地令牌桶拒绝（未等待）
    #[error("请求过于频繁，已触发限流: {0}")]
    RateLimitExceeded(String),

    /// 上游超时
    #[error("上游请求超时: {0}")]
    UpstreamTimeout(String),

    /// 上游返回非成功状态（4xx，429 除外）
    #[error("上游HTTP错误 ({status}): {message}")]
    UpstreamHttp { status: u16, message: String },

    /// 上游服务端错误（5xx）
    #[error("上游服务错误 ({status}): {message}")]
    UpstreamServer { status: u16, message: String },

    /// 网络错误
    #[error("网络错误: {0}")]
    UpstreamNetwork(String),

    /// 响应解析错误
    #[error("解析错误: {0}")]
    UpstreamParse(String),

    /// 上游自身限流（429）
    #[error("上游限流: {message}")]
    UpstreamRateLimit {
        retry_after: Option<Duration>,
        message: String,
    },

    /// 配置错误（仅在启动时出现）
    #[error("配置错误: {0}")]
    Config(String),

    /// 未知错误
    #[error("未知错误: {0}")]
    Unknown(String),
}

/// 机器可读的错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    RateLimit,
    Timeout,
    HttpError,
    UpstreamServerError,
    NetworkError,
    ParseError,
    UpstreamRateLimit,
    Config,
    Unknown,
}

impl ErrorKind {
    /// 所有错误类别
    pub const ALL: [ErrorKind; 10] = [
        ErrorKind::Validation,
        ErrorKind::RateLimit,
        ErrorKind::Timeout,
        ErrorKind::HttpError,
        ErrorKind::UpstreamServerError,
        ErrorKind::NetworkError,
        ErrorKind::ParseError,
        ErrorKind::UpstreamRateLimit,
        ErrorKind::Config,
        ErrorKind::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::RateLimit => "rate_limit",
            ErrorKind::Timeout => "timeout",
            ErrorKind::HttpError => "http_error",
            ErrorKind::UpstreamServerError => "upstream_server_error",
            ErrorKind::NetworkError => "network_error",
            ErrorKind::ParseError => "parse_error",
            ErrorKind::UpstreamRateLimit => "upstream_rate_limit",
            ErrorKind::Config => "config",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl DictError {
    /// 获取错误类别
    pub fn kind(&self) -> ErrorKind {
        match self {
            DictError::Validation(_) => ErrorKind::Validation,
            DictError::RateLimitExceeded(_) => ErrorKind::RateLimit,
            DictError::UpstreamTimeout(_) => ErrorKind::Timeout,
            DictError::UpstreamHttp { .. } => ErrorKind::HttpError,
            DictError::UpstreamServer { .. } => ErrorKind::UpstreamServerError,
            DictError::UpstreamNetwork(_) => ErrorKind::NetworkError,
            DictError::UpstreamParse(_) => ErrorKind::ParseError,
            DictError::UpstreamRateLimit { .. } => ErrorKind::UpstreamRateLimit,
            DictError::Config(_) => ErrorKind::Config,
            DictError::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// 检查错误是否可由获取器重试
    pub fn is_retryable(&self) -> bool {
        match self {
            DictError::UpstreamTimeout(_) => true,
            DictError::UpstreamNetwork(_) => true,
            DictError::UpstreamServer { .. } => true,
            DictError::UpstreamRateLimit { .. } => true,
            DictError::UpstreamHttp { .. } => false,
            DictError::UpstreamParse(_) => false,
            DictError::Validation(_) => false,
            DictError::RateLimitExceeded(_) => false, // 本地限流需要调用方等待
            DictError::Config(_) => false,
            DictError::Unknown(_) => false,
        }
    }

    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            DictError::Validation(_) => ErrorSeverity::Info,
            DictError::RateLimitExceeded(_) => ErrorSeverity::Warning,
            DictError::UpstreamRateLimit { .. } => ErrorSeverity::Warning,
            DictError::UpstreamTimeout(_) => ErrorSeverity::Warning,
            DictError::UpstreamNetwork(_) => ErrorSeverity::Warning,
            DictError::UpstreamHttp { .. } => ErrorSeverity::Error,
            DictError::UpstreamServer { .. } => ErrorSeverity::Error,
            DictError::UpstreamParse(_) => ErrorSeverity::Error,
            DictError::Config(_) => ErrorSeverity::Critical,
            DictError::Unknown(_) => ErrorSeverity::Critical,
        }
    }

    /// 面向调用方的详细信息（不含类别前缀）
    pub fn details(&self) -> String {
        match self {
            DictError::Validation(msg)
            | DictError::RateLimitExceeded(msg)
            | DictError::UpstreamTimeout(msg)
            | DictError::UpstreamNetwork(msg)
            | DictError::UpstreamParse(msg)
            | DictError::Config(msg)
            | DictError::Unknown(msg) => msg.clone(),
            DictError::UpstreamHttp { status, message }
            | DictError::UpstreamServer { status, message } => {
                format!("status={status}, {message}")
            }
            DictError::UpstreamRateLimit {
                retry_after,
                message,
            } => match retry_after {
                Some(after) => format!("{message} (retry_after={}s)", after.as_secs()),
                None => message.clone(),
            },
        }
    }

    /// 上游建议的重试等待时间
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            DictError::UpstreamRateLimit { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for DictError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            DictError::UpstreamTimeout(error.to_string())
        } else if error.is_decode() {
            DictError::UpstreamParse(error.to_string())
        } else if let Some(status) = error.status() {
            DictError::UpstreamHttp {
                status: status.as_u16(),
                message: error.to_string(),
            }
        } else if error.is_connect() || error.is_request() || error.is_body() {
            DictError::UpstreamNetwork(error.to_string())
        } else {
            DictError::Unknown(error.to_string())
        }
    }
}

impl From<serde_json::Error> for DictError {
    fn from(error: serde_json::Error) -> Self {
        DictError::UpstreamParse(format!("JSON解析错误: {}", error))
    }
}

impl From<toml::de::Error> for DictError {
    fn from(error: toml::de::Error) -> Self {
        DictError::Config(format!("TOML解析错误: {}", error))
    }
}

impl From<tokio::time::error::Elapsed> for DictError {
    fn from(error: tokio::time::error::Elapsed) -> Self {
        DictError::UpstreamTimeout(format!("异步操作超时: {}", error))
    }
}

impl From<EnvError> for DictError {
    fn from(error: EnvError) -> Self {
        DictError::Config(error.to_string())
    }
}

/// 错误结果类型别名
pub type DictResult<T> = Result<T, DictError>;

/// 错误处理助手函数
pub mod helpers {
    use super::*;

    /// 按严重程度记录错误
    pub fn log_error(error: &DictError) {
        match error.severity() {
            ErrorSeverity::Info => tracing::info!("查询信息: {}", error),
            ErrorSeverity::Warning => tracing::warn!("查询警告: {}", error),
            ErrorSeverity::Error => tracing::error!("查询错误: {}", error),
            ErrorSeverity::Critical => tracing::error!("查询严重错误: {}", error),
        }
    }
}
