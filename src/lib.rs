//! # Naver Dict Library
//!
//! Naver 韩语词典查询服务，带缓存、限流与批量去重。
//!
//! ## 模块组织
//!
//! - `dictionary` - 资源保护层：缓存、限流器、批量编排与指标
//! - `network` - 上游获取器接口与 Naver 实现
//! - `env` - 类型安全的环境变量
//! - `logging` - 日志初始化（可选）
//! - `web` - Web服务器功能（可选）

pub mod dictionary;
pub mod env;
#[cfg(any(feature = "cli", feature = "web"))]
pub mod logging;
pub mod network;
#[cfg(feature = "web")]
pub mod web;

// Re-export commonly used items for convenience
pub use dictionary::{
    BatchResponse, DictConfig, DictError, DictResult, DictType, DictionaryService, ErrorKind,
    LookupResponse,
};
pub use network::{Fetcher, NaverFetcher};
