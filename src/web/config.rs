//! Web 服务器配置
//!
//! 使用类型安全的环境变量系统进行配置管理

use crate::env::{EnvError, EnvResult, EnvVar};

/// Web 服务器配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebConfig {
    /// 绑定地址
    pub bind_addr: String,
    /// 端口
    pub port: u16,
}

impl WebConfig {
    /// 从环境变量创建配置
    pub fn from_env() -> EnvResult<Self> {
        use crate::env::web;

        Ok(Self {
            bind_addr: web::BindAddress::get()?,
            port: web::Port::get()?,
        })
    }

    /// 验证配置
    pub fn validate(&self) -> EnvResult<()> {
        if self.bind_addr.is_empty() {
            return Err(EnvError {
                variable: "NAVER_DICT_WEB_BIND_ADDRESS".to_string(),
                message: "Bind address cannot be empty".to_string(),
            });
        }

        if self.port == 0 {
            return Err(EnvError {
                variable: "NAVER_DICT_WEB_PORT".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        Ok(())
    }

    /// 获取完整的监听地址
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self::from_env().unwrap_or_else(|e| {
            tracing::warn!("读取 Web 配置失败，使用默认值: {}", e);
            Self {
                bind_addr: "127.0.0.1".to_string(),
                port: 8000,
            }
        })
    }
}
