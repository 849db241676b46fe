//! 词典模块
//!
//! 查询 Naver 韩语词典的资源保护层：
//! - **core**: 词典服务与健康检查
//! - **pipeline**: 查询词规范化与批量编排
//! - **storage**: TTL + LRU 查询缓存
//! - **limiter**: 共享令牌桶
//! - **metrics**: 请求计数与延迟百分位
//! - **config**: 配置管理
//! - **error**: 错误处理
//!
//! # 基本用法
//!
//! ```rust,no_run
//! use naver_dict::dictionary::{DictConfig, DictType, DictionaryService};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = DictionaryService::new(DictConfig::default())?;
//! let response = service.lookup("안녕하세요", DictType::KoZh).await?;
//! println!("找到 {} 个词条", response.count);
//! # Ok(())
//! # }
//! ```

// ============================================================================
// 子模块声明
// ============================================================================

/// 配置管理模块
pub mod config;

/// 核心服务模块
pub mod core;

/// 错误处理模块
pub mod error;

/// 令牌桶限流器
pub mod limiter;

/// 指标收集器
pub mod metrics;

/// 查询管道模块 - 规范化、校验与批量编排
pub mod pipeline;

/// 响应模型
pub mod responses;

/// 存储模块 - 查询缓存
pub mod storage;

/// 领域类型
pub mod types;

// ============================================================================
// 重新导出
// ============================================================================

pub use config::{ConfigManager, DictConfig};
pub use self::core::{DictionaryService, HealthLevel, HealthStatus};
pub use error::{DictError, DictResult, ErrorKind, ErrorSeverity};
pub use limiter::{LimiterStats, TokenBucket};
pub use metrics::{MetricsCollector, MetricsSnapshot, Outcome};
pub use pipeline::{BatchGroup, BatchOrchestrator, BatchSettings};
pub use responses::{BatchItem, BatchResponse, CachedJsonItem, LookupFailure, LookupResponse};
pub use storage::{CacheKey, CacheStats, LookupCache};
pub use types::{DictType, LookupPayload};
