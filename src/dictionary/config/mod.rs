//! 词典配置管理模块
//!
//! 提供简化的配置管理，支持环境变量、配置文件和默认值

pub mod manager;

// 重新导出主要类型
pub use manager::{ConfigManager, DictConfig};

/// 配置常量
pub mod constants {
    use std::time::Duration;

    // 上游设置
    pub const DEFAULT_BASE_URL: &str = "https://korean.dict.naver.com/api3";
    pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);
    pub const DEFAULT_USER_AGENT: &str =
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
    pub const DEFAULT_REFERER: &str = "https://korean.dict.naver.com/";

    // 重试设置
    pub const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 3;
    pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 200;
    pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 2000;

    // 缓存设置
    pub const DEFAULT_CACHE_CAPACITY: usize = 1000;
    pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600); // 1小时
    pub const DEFAULT_NEGATIVE_CACHE_TTL: Duration = Duration::from_secs(300);

    // 限流设置：每分钟 60 个请求
    pub const DEFAULT_RATE_LIMIT_CAPACITY: f64 = 60.0;
    pub const DEFAULT_RATE_LIMIT_REFILL_PER_SECOND: f64 = 1.0;
    pub const DEFAULT_RATE_LIMIT_WAIT_TIMEOUT: Duration = Duration::from_secs(5);

    // 批量查询设置
    pub const DEFAULT_BATCH_MAX_SIZE: usize = 10;
    pub const DEFAULT_BATCH_MAX_CONCURRENCY: usize = 3;

    // 输入校验
    pub const MAX_WORD_LENGTH: usize = 50;

    // 延迟采样窗口
    pub const MAX_LATENCY_SAMPLES: usize = 1000;

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "naver-dict.toml",
        ".naver-dict.toml",
        "naver-dict.json",
        "~/.config/naver-dict/config.toml",
        "/etc/naver-dict/config.toml",
    ];
}

/// 检查配置文件是否存在
pub fn config_file_exists() -> bool {
    constants::CONFIG_PATHS
        .iter()
        .any(|path| std::path::Path::new(shellexpand::tilde(path).as_ref()).exists())
}

/// 加载配置，失败时回退到默认配置
pub fn load_dict_config() -> DictConfig {
    match ConfigManager::new() {
        Ok(manager) => manager.into_config(),
        Err(e) => {
            tracing::warn!("配置加载失败，使用默认配置: {}", e);
            DictConfig::default()
        }
    }
}
