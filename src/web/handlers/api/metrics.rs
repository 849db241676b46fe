//! 指标与健康检查处理器

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

use crate::dictionary::{HealthLevel, MetricsSnapshot};
use crate::web::types::{AppState, MessageResponse};

/// 获取指标快照
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> Json<MetricsSnapshot> {
    Json(state.service.metrics_snapshot())
}

/// 重置指标
pub async fn reset_metrics(State(state): State<Arc<AppState>>) -> Json<MessageResponse> {
    state.service.reset_metrics();
    Json(MessageResponse {
        success: true,
        message: "指标已重置".to_string(),
    })
}

/// 健康检查；令牌耗尽时仍返回 200，状态为 degraded
pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    let health = state.service.health();
    let status = match health.overall {
        HealthLevel::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::OK,
    };
    (status, Json(health)).into_response()
}
