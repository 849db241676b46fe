//! Web 路由定义

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::web::{handlers::*, types::AppState};

/// 创建路由结构
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        // 查询工具
        .route("/api/tools/search_word", post(search_word))
        .route("/api/tools/batch_search_words", post(batch_search_words))
        // 指标
        .route("/api/metrics", get(get_metrics))
        .route("/api/metrics/reset", post(reset_metrics))
        // 缓存管理
        .route("/api/cache/stats", get(get_cache_stats))
        .route("/api/cache/clear", post(clear_cache))
        .route("/health", get(health))
}
