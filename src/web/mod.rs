//! Web 服务器模块
//!
//! 以 JSON over HTTP 的形式暴露词典查询工具与维护接口

pub mod config;
pub mod handlers;
pub mod routes;
pub mod types;

pub use config::*;
pub use routes::*;
pub use types::*;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;

use crate::dictionary::{DictError, DictResult, DictionaryService};

/// Web 服务器
pub struct WebServer {
    config: WebConfig,
    service: Arc<DictionaryService>,
}

impl WebServer {
    /// 创建新的 Web 服务器
    pub fn new(config: WebConfig, service: Arc<DictionaryService>) -> Self {
        Self { config, service }
    }

    /// 启动 Web 服务器
    pub async fn start(&self) -> DictResult<()> {
        self.config.validate()?;

        let app = create_router(Arc::new(AppState {
            service: self.service.clone(),
        }));

        let address = self.config.listen_address();
        let listener = tokio::net::TcpListener::bind(&address)
            .await
            .map_err(|e| DictError::Config(format!("绑定地址 {} 失败: {}", address, e)))?;

        tracing::info!("Web 服务器启动: http://{}", address);

        axum::serve(listener, app)
            .await
            .map_err(|e| DictError::Unknown(format!("服务器错误: {}", e)))?;

        Ok(())
    }
}

/// 创建路由器
pub fn create_router(app_state: Arc<AppState>) -> Router {
    create_routes()
        .with_state(app_state)
        // 添加CORS支持
        .layer(CorsLayer::permissive())
}
