//! 配置管理器
//!
//! 提供统一的配置接口，支持文件配置、环境变量和默认值

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::constants;
use crate::dictionary::error::{DictError, DictResult};

/// 词典服务配置
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DictConfig {
    // 上游配置
    pub base_url: String,
    pub http_timeout_secs: u64,
    pub user_agent: String,

    // 重试配置
    pub retry_max_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,

    // 缓存配置
    pub cache_capacity: usize,
    pub cache_ttl_secs: u64,
    pub cache_negative_ttl_secs: u64,

    // 限流配置
    pub rate_limit_capacity: f64,
    pub rate_limit_refill_per_sec: f64,
    pub rate_limit_wait: bool,
    pub rate_limit_wait_timeout_secs: u64,

    // 批量配置
    pub batch_max_size: usize,
    pub batch_max_concurrency: usize,
    pub fetch_timeout_secs: u64,

    // 输入校验
    pub max_word_length: usize,
}

impl Default for DictConfig {
    fn default() -> Self {
        let mut config = Self {
            base_url: constants::DEFAULT_BASE_URL.to_string(),
            http_timeout_secs: constants::DEFAULT_HTTP_TIMEOUT.as_secs(),
            user_agent: constants::DEFAULT_USER_AGENT.to_string(),

            retry_max_attempts: constants::DEFAULT_RETRY_MAX_ATTEMPTS,
            retry_base_delay_ms: constants::DEFAULT_RETRY_BASE_DELAY_MS,
            retry_max_delay_ms: constants::DEFAULT_RETRY_MAX_DELAY_MS,

            cache_capacity: constants::DEFAULT_CACHE_CAPACITY,
            cache_ttl_secs: constants::DEFAULT_CACHE_TTL.as_secs(),
            cache_negative_ttl_secs: constants::DEFAULT_NEGATIVE_CACHE_TTL.as_secs(),

            rate_limit_capacity: constants::DEFAULT_RATE_LIMIT_CAPACITY,
            rate_limit_refill_per_sec: constants::DEFAULT_RATE_LIMIT_REFILL_PER_SECOND,
            rate_limit_wait: false,
            rate_limit_wait_timeout_secs: constants::DEFAULT_RATE_LIMIT_WAIT_TIMEOUT.as_secs(),

            batch_max_size: constants::DEFAULT_BATCH_MAX_SIZE,
            batch_max_concurrency: constants::DEFAULT_BATCH_MAX_CONCURRENCY,
            fetch_timeout_secs: 0,

            max_word_length: constants::MAX_WORD_LENGTH,
        };
        config.fetch_timeout_secs = config.retry_budget_secs();
        config
    }
}

impl DictConfig {
    /// 验证配置
    pub fn validate(&self) -> DictResult<()> {
        url::Url::parse(&self.base_url)
            .map_err(|e| DictError::Config(format!("上游地址无效 '{}': {}", self.base_url, e)))?;

        let positive_counts = [
            ("cache_capacity", self.cache_capacity as u64),
            ("cache_ttl_secs", self.cache_ttl_secs),
            ("cache_negative_ttl_secs", self.cache_negative_ttl_secs),
            ("batch_max_size", self.batch_max_size as u64),
            ("batch_max_concurrency", self.batch_max_concurrency as u64),
            ("http_timeout_secs", self.http_timeout_secs),
            ("fetch_timeout_secs", self.fetch_timeout_secs),
            ("retry_max_attempts", self.retry_max_attempts as u64),
            ("max_word_length", self.max_word_length as u64),
        ];
        for (name, value) in positive_counts {
            if value == 0 {
                return Err(DictError::Config(format!("{} 必须大于0", name)));
            }
        }

        for (name, value) in [
            ("rate_limit_capacity", self.rate_limit_capacity),
            ("rate_limit_refill_per_sec", self.rate_limit_refill_per_sec),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(DictError::Config(format!("{} 必须为大于0的有限数", name)));
            }
        }

        if self.rate_limit_capacity < 1.0 {
            return Err(DictError::Config(
                "rate_limit_capacity 至少为1，否则任何请求都无法获得令牌".to_string(),
            ));
        }

        if self.retry_base_delay_ms > self.retry_max_delay_ms {
            return Err(DictError::Config(
                "retry_base_delay_ms 不能大于 retry_max_delay_ms".to_string(),
            ));
        }

        // 总超时包住获取器的整个重试循环，至少要容纳一次完整的 HTTP 请求
        if self.fetch_timeout_secs < self.http_timeout_secs {
            return Err(DictError::Config(format!(
                "fetch_timeout_secs ({}) 不能小于 http_timeout_secs ({})，否则超时永远无法重试",
                self.fetch_timeout_secs, self.http_timeout_secs
            )));
        }
        if self.fetch_timeout_secs < self.retry_budget_secs() {
            tracing::warn!(
                "fetch_timeout_secs={} 小于完整重试所需的 {}s，后续重试可能被截断",
                self.fetch_timeout_secs,
                self.retry_budget_secs()
            );
        }

        Ok(())
    }

    /// 完整重试循环所需的时间：每次尝试的 HTTP 超时加上各次退避上限
    pub fn retry_budget_secs(&self) -> u64 {
        let attempts = u64::from(self.retry_max_attempts.max(1));
        let backoff_ms = self.retry_max_delay_ms.saturating_mul(attempts - 1);
        self.http_timeout_secs
            .saturating_mul(attempts)
            .saturating_add(backoff_ms.div_ceil(1000))
    }

    /// 应用环境变量覆盖
    pub fn apply_env_overrides(&mut self) -> DictResult<()> {
        use crate::env::{batch, cache, rate_limit, upstream, EnvVar};

        if let Some(base_url) = upstream::BaseUrl::get_set() {
            self.base_url = base_url?;
            tracing::info!("环境变量覆盖上游地址: {}", self.base_url);
        }
        if let Some(timeout) = upstream::HttpTimeout::get_set() {
            self.http_timeout_secs = timeout?.as_secs();
        }
        if let Some(attempts) = upstream::RetryMaxAttempts::get_set() {
            self.retry_max_attempts = attempts?;
        }

        if let Some(capacity) = cache::Capacity::get_set() {
            self.cache_capacity = capacity?;
        }
        if let Some(ttl) = cache::Ttl::get_set() {
            self.cache_ttl_secs = ttl?.as_secs();
        }
        if let Some(ttl) = cache::NegativeTtl::get_set() {
            self.cache_negative_ttl_secs = ttl?.as_secs();
        }

        if let Some(capacity) = rate_limit::Capacity::get_set() {
            self.rate_limit_capacity = capacity?;
        }
        if let Some(rate) = rate_limit::RefillPerSecond::get_set() {
            self.rate_limit_refill_per_sec = rate?;
        }

        if let Some(size) = batch::MaxSize::get_set() {
            self.batch_max_size = size?;
        }
        if let Some(concurrency) = batch::MaxConcurrency::get_set() {
            self.batch_max_concurrency = concurrency?;
        }

        Ok(())
    }

    /// 转换为Duration类型
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn negative_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_negative_ttl_secs)
    }

    pub fn rate_limit_wait_timeout(&self) -> Duration {
        Duration::from_secs(self.rate_limit_wait_timeout_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn retry_max_delay(&self) -> Duration {
        Duration::from_millis(self.retry_max_delay_ms)
    }
}

/// 配置管理器
pub struct ConfigManager {
    config: DictConfig,
}

impl ConfigManager {
    /// 创建新的配置管理器：.env → 配置文件 → 环境变量 → 校验
    pub fn new() -> DictResult<Self> {
        let mut config = Self::load_config()?;
        config.apply_env_overrides()?;
        config.validate()?;

        Ok(Self { config })
    }

    /// 从指定文件创建（仍会应用环境变量覆盖）
    pub fn from_file(path: &str) -> DictResult<Self> {
        let mut config = Self::load_from_file(path)?;
        config.apply_env_overrides()?;
        config.validate()?;

        Ok(Self { config })
    }

    /// 获取配置
    pub fn get_config(&self) -> &DictConfig {
        &self.config
    }

    pub fn into_config(self) -> DictConfig {
        self.config
    }

    /// 从搜索路径加载配置
    fn load_config() -> DictResult<DictConfig> {
        Self::load_dotenv();

        for path in constants::CONFIG_PATHS {
            let expanded_path = shellexpand::tilde(path);
            if Path::new(expanded_path.as_ref()).exists() {
                tracing::info!("加载配置文件: {}", expanded_path);
                return Self::load_from_file(&expanded_path);
            }
        }

        tracing::info!("未找到配置文件，使用默认配置");
        Ok(DictConfig::default())
    }

    /// 从指定文件加载配置
    fn load_from_file(path: &str) -> DictResult<DictConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DictError::Config(format!("读取配置文件失败: {}", e)))?;

        Self::parse_config(path, &content)
    }

    /// 按扩展名解析配置内容
    pub fn parse_config(path: &str, content: &str) -> DictResult<DictConfig> {
        if path.ends_with(".json") {
            serde_json::from_str(content)
                .map_err(|e| DictError::Config(format!("解析JSON配置失败: {}", e)))
        } else {
            Ok(toml::from_str(content)?)
        }
    }

    /// 加载 .env 文件
    fn load_dotenv() {
        let env_files = [".env.local", ".env"];

        for env_file in &env_files {
            if Path::new(env_file).exists() && dotenv::from_filename(env_file).is_ok() {
                tracing::info!("已加载环境变量文件: {}", env_file);
                break;
            }
        }
    }

    /// 生成示例配置文件
    pub fn generate_example_config(path: &str) -> DictResult<()> {
        let config = DictConfig::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| DictError::Config(format!("序列化配置失败: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| DictError::Config(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }
}
