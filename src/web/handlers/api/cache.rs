//! 缓存相关API处理器

use std::sync::Arc;

use axum::{extract::State, response::Json};

use crate::dictionary::CacheStats;
use crate::web::types::{AppState, CacheClearResponse};

/// 获取缓存统计信息
pub async fn get_cache_stats(State(state): State<Arc<AppState>>) -> Json<CacheStats> {
    Json(state.service.cache_stats())
}

/// 清理缓存
pub async fn clear_cache(State(state): State<Arc<AppState>>) -> Json<CacheClearResponse> {
    let cleared = state.service.clear_cache();
    Json(CacheClearResponse {
        success: true,
        cleared,
        message: format!("成功清理 {} 个缓存条目", cleared),
    })
}
