//! 词典服务核心模块
//!
//! ## 模块依赖关系
//!
//! ```text
//! DictionaryService (service.rs)
//!     ├── LookupCache (storage/cache.rs)
//!     ├── TokenBucket (limiter.rs)
//!     ├── MetricsCollector (metrics.rs)
//!     └── BatchOrchestrator (pipeline/batch.rs)
//!             └── Fetcher (network)
//! ```

pub mod service;

/// 统一词典服务 - 主要的对外接口
pub use service::DictionaryService;

/// 系统健康状态检查结果
pub use service::{HealthLevel, HealthStatus};

pub use service::{ENDPOINT_BATCH, ENDPOINT_SEARCH};
