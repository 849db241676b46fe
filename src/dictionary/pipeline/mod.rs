//! 查询管道模块
//!
//! 提供查询词规范化与批量查询编排

pub mod batch;
pub mod normalize;

// 重新导出主要类型
pub use batch::{BatchGroup, BatchOrchestrator, BatchSettings};
pub use normalize::{normalize_word, validate_word};
