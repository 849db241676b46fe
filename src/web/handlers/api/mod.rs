//! API 处理器

pub mod cache;
pub mod lookup;
pub mod metrics;

pub use cache::*;
pub use lookup::*;
pub use metrics::*;
