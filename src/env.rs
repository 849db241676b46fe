//! 统一的环境变量管理系统
//!
//! 提供类型安全、可验证的环境变量读取，所有变量均以 `NAVER_DICT_` 为前缀

use std::env;
use std::fmt;
use std::time::Duration;

/// 环境变量解析错误
#[derive(Debug, Clone)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => {
                if let Some(default) = Self::DEFAULT {
                    Ok(default)
                } else {
                    Err(EnvError {
                        variable: Self::NAME.to_string(),
                        message: "Required environment variable not set".to_string(),
                    })
                }
            }
        }
    }

    /// 仅在变量被显式设置时返回值
    fn get_set() -> Option<EnvResult<T>> {
        env::var(Self::NAME).ok().map(|value| Self::parse(&value))
    }
}

/// 核心环境变量定义
pub mod core {
    use super::*;

    /// 日志级别
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "NAVER_DICT_LOG_LEVEL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("info".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            match value.to_lowercase().as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => Ok(value.to_lowercase()),
                // 兼容 Python logging 的级别名
                "warning" => Ok("warn".to_string()),
                "critical" => Ok("error".to_string()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!(
                        "Invalid log level '{}'. Use: trace, debug, info, warn, error",
                        value
                    ),
                }),
            }
        }
    }
}

/// 上游词典相关环境变量
pub mod upstream {
    use super::*;

    /// 上游 API 基础地址
    pub struct BaseUrl;
    impl EnvVar<String> for BaseUrl {
        const NAME: &'static str = "NAVER_DICT_BASE_URL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Naver dictionary API base URL";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("https://korean.dict.naver.com/api3".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            let parsed = url::Url::parse(value.trim()).map_err(|e| EnvError {
                variable: Self::NAME.to_string(),
                message: format!("Invalid URL '{}': {}", value, e),
            })?;

            match parsed.scheme() {
                "http" | "https" => Ok(value.trim().trim_end_matches('/').to_string()),
                other => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!("Unsupported scheme '{}'. Use http or https", other),
                }),
            }
        }
    }

    /// HTTP 超时
    pub struct HttpTimeout;
    impl EnvVar<Duration> for HttpTimeout {
        const NAME: &'static str = "NAVER_DICT_HTTP_TIMEOUT";
        const DEFAULT: Option<Duration> = Some(Duration::from_secs(30));
        const DESCRIPTION: &'static str = "Upstream HTTP timeout in seconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            parse_seconds(value, Self::NAME, 1, 300)
        }
    }

    /// 最大重试次数（含首次请求）
    pub struct RetryMaxAttempts;
    impl EnvVar<u32> for RetryMaxAttempts {
        const NAME: &'static str = "NAVER_DICT_RETRY_MAX_ATTEMPTS";
        const DEFAULT: Option<u32> = Some(3);
        const DESCRIPTION: &'static str = "Maximum upstream attempts per lookup (including the first)";

        fn parse(value: &str) -> EnvResult<u32> {
            parse_positive_usize(value, Self::NAME, 1, 10).map(|n| n as u32)
        }
    }
}

/// 缓存相关环境变量
pub mod cache {
    use super::*;

    /// 缓存容量
    pub struct Capacity;
    impl EnvVar<usize> for Capacity {
        const NAME: &'static str = "NAVER_DICT_CACHE_CAPACITY";
        const DEFAULT: Option<usize> = Some(1000);
        const DESCRIPTION: &'static str = "Cache capacity (number of entries)";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 1, 1_000_000)
        }
    }

    /// 缓存TTL
    pub struct Ttl;
    impl EnvVar<Duration> for Ttl {
        const NAME: &'static str = "NAVER_DICT_CACHE_TTL";
        const DEFAULT: Option<Duration> = Some(Duration::from_secs(3600));
        const DESCRIPTION: &'static str = "Cache TTL in seconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            parse_seconds(value, Self::NAME, 1, 86400 * 7)
        }
    }

    /// 负缓存TTL（未找到结果）
    pub struct NegativeTtl;
    impl EnvVar<Duration> for NegativeTtl {
        const NAME: &'static str = "NAVER_DICT_CACHE_NEGATIVE_TTL";
        const DEFAULT: Option<Duration> = Some(Duration::from_secs(300));
        const DESCRIPTION: &'static str = "TTL in seconds for cached not-found results";

        fn parse(value: &str) -> EnvResult<Duration> {
            parse_seconds(value, Self::NAME, 1, 86400)
        }
    }
}

/// 限流相关环境变量
pub mod rate_limit {
    use super::*;

    /// 令牌桶容量
    pub struct Capacity;
    impl EnvVar<f64> for Capacity {
        const NAME: &'static str = "NAVER_DICT_RATE_LIMIT_CAPACITY";
        const DEFAULT: Option<f64> = Some(60.0);
        const DESCRIPTION: &'static str = "Token bucket capacity (burst size)";

        fn parse(value: &str) -> EnvResult<f64> {
            parse_positive_f64(value, Self::NAME, 10_000.0)
        }
    }

    /// 每秒补充令牌数
    pub struct RefillPerSecond;
    impl EnvVar<f64> for RefillPerSecond {
        const NAME: &'static str = "NAVER_DICT_RATE_LIMIT_REFILL_PER_SECOND";
        const DEFAULT: Option<f64> = Some(1.0);
        const DESCRIPTION: &'static str = "Tokens added to the bucket per second";

        fn parse(value: &str) -> EnvResult<f64> {
            parse_positive_f64(value, Self::NAME, 1000.0)
        }
    }
}

/// 批量查询相关环境变量
pub mod batch {
    use super::*;

    /// 单批最大词数
    pub struct MaxSize;
    impl EnvVar<usize> for MaxSize {
        const NAME: &'static str = "NAVER_DICT_BATCH_MAX_SIZE";
        const DEFAULT: Option<usize> = Some(10);
        const DESCRIPTION: &'static str = "Maximum number of words per batch lookup";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 1, 100)
        }
    }

    /// 最大并发上游请求数
    pub struct MaxConcurrency;
    impl EnvVar<usize> for MaxConcurrency {
        const NAME: &'static str = "NAVER_DICT_BATCH_MAX_CONCURRENCY";
        const DEFAULT: Option<usize> = Some(3);
        const DESCRIPTION: &'static str = "Maximum simultaneous upstream fetches";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 1, 64)
        }
    }
}

/// Web服务器相关环境变量
pub mod web {
    use super::*;

    /// 绑定地址
    pub struct BindAddress;
    impl EnvVar<String> for BindAddress {
        const NAME: &'static str = "NAVER_DICT_WEB_BIND_ADDRESS";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Web server bind address";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("127.0.0.1".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            let value = value.trim();
            if value.is_empty() {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Bind address cannot be empty".to_string(),
                });
            }
            Ok(value.to_string())
        }
    }

    /// 端口
    pub struct Port;
    impl EnvVar<u16> for Port {
        const NAME: &'static str = "NAVER_DICT_WEB_PORT";
        const DEFAULT: Option<u16> = Some(8000);
        const DESCRIPTION: &'static str = "Web server port";

        fn parse(value: &str) -> EnvResult<u16> {
            let port: u16 = value.trim().parse().map_err(|_| EnvError {
                variable: Self::NAME.to_string(),
                message: "Must be a valid port number (1-65535)".to_string(),
            })?;

            if port == 0 {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Port cannot be 0".to_string(),
                });
            }

            Ok(port)
        }
    }
}

/// 辅助函数
fn parse_positive_usize(value: &str, var_name: &str, min: usize, max: usize) -> EnvResult<usize> {
    let num: usize = value.trim().parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid positive number".to_string(),
    })?;

    if num < min {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} is below minimum {}", num, min),
        });
    }

    if num > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} exceeds maximum {}", num, max),
        });
    }

    Ok(num)
}

fn parse_positive_f64(value: &str, var_name: &str, max: f64) -> EnvResult<f64> {
    let num: f64 = value.trim().parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid number".to_string(),
    })?;

    if !num.is_finite() || num <= 0.0 {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: "Value must be greater than 0".to_string(),
        });
    }

    if num > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} exceeds maximum {}", num, max),
        });
    }

    Ok(num)
}

fn parse_seconds(value: &str, var_name: &str, min: u64, max: u64) -> EnvResult<Duration> {
    let seconds: u64 = value.trim().parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid number of seconds".to_string(),
    })?;

    if seconds < min {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Duration too short (minimum {} seconds)", min),
        });
    }

    if seconds > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Duration too long (maximum {} seconds)", max),
        });
    }

    Ok(Duration::from_secs(seconds))
}

fn push_doc_line<T: fmt::Debug>(docs: &mut String, name: &str, description: &str, default: Option<T>) {
    match default {
        Some(default) => docs.push_str(&format!(
            "- `{}`: {} (default: {:?})\n",
            name, description, default
        )),
        None => docs.push_str(&format!("- `{}`: {}\n", name, description)),
    }
}

/// 环境变量文档生成器
pub fn generate_env_docs() -> String {
    let mut docs = String::new();
    docs.push_str("# Environment Variables Documentation\n\n");

    docs.push_str("## Core Configuration\n\n");
    push_doc_line(&mut docs, core::LogLevel::NAME, core::LogLevel::DESCRIPTION, Some("info"));

    docs.push_str("\n## Upstream Configuration\n\n");
    push_doc_line(
        &mut docs,
        upstream::BaseUrl::NAME,
        upstream::BaseUrl::DESCRIPTION,
        Some("https://korean.dict.naver.com/api3"),
    );
    push_doc_line(
        &mut docs,
        upstream::HttpTimeout::NAME,
        upstream::HttpTimeout::DESCRIPTION,
        upstream::HttpTimeout::DEFAULT,
    );
    push_doc_line(
        &mut docs,
        upstream::RetryMaxAttempts::NAME,
        upstream::RetryMaxAttempts::DESCRIPTION,
        upstream::RetryMaxAttempts::DEFAULT,
    );

    docs.push_str("\n## Cache Configuration\n\n");
    push_doc_line(&mut docs, cache::Capacity::NAME, cache::Capacity::DESCRIPTION, cache::Capacity::DEFAULT);
    push_doc_line(&mut docs, cache::Ttl::NAME, cache::Ttl::DESCRIPTION, cache::Ttl::DEFAULT);
    push_doc_line(
        &mut docs,
        cache::NegativeTtl::NAME,
        cache::NegativeTtl::DESCRIPTION,
        cache::NegativeTtl::DEFAULT,
    );

    docs.push_str("\n## Rate Limit Configuration\n\n");
    push_doc_line(
        &mut docs,
        rate_limit::Capacity::NAME,
        rate_limit::Capacity::DESCRIPTION,
        rate_limit::Capacity::DEFAULT,
    );
    push_doc_line(
        &mut docs,
        rate_limit::RefillPerSecond::NAME,
        rate_limit::RefillPerSecond::DESCRIPTION,
        rate_limit::RefillPerSecond::DEFAULT,
    );

    docs.push_str("\n## Batch Configuration\n\n");
    push_doc_line(&mut docs, batch::MaxSize::NAME, batch::MaxSize::DESCRIPTION, batch::MaxSize::DEFAULT);
    push_doc_line(
        &mut docs,
        batch::MaxConcurrency::NAME,
        batch::MaxConcurrency::DESCRIPTION,
        batch::MaxConcurrency::DEFAULT,
    );

    docs.push_str("\n## Web Server Configuration\n\n");
    push_doc_line(&mut docs, web::BindAddress::NAME, web::BindAddress::DESCRIPTION, Some("127.0.0.1"));
    push_doc_line(&mut docs, web::Port::NAME, web::Port::DESCRIPTION, web::Port::DEFAULT);

    docs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(core::LogLevel::parse("DEBUG").unwrap(), "debug");
        assert_eq!(core::LogLevel::parse("warning").unwrap(), "warn");
        assert!(core::LogLevel::parse("verbose").is_err());
    }

    #[test]
    fn test_url_validation() {
        assert_eq!(
            upstream::BaseUrl::parse("https://korean.dict.naver.com/api3/").unwrap(),
            "https://korean.dict.naver.com/api3"
        );
        assert!(upstream::BaseUrl::parse("http://localhost:9000").is_ok());

        assert!(upstream::BaseUrl::parse("ftp://example.com").is_err());
        assert!(upstream::BaseUrl::parse("not-a-url").is_err());
    }

    #[test]
    fn test_numeric_validation() {
        assert!(rate_limit::RefillPerSecond::parse("0.5").is_ok());
        assert!(rate_limit::RefillPerSecond::parse("0").is_err());
        assert!(rate_limit::RefillPerSecond::parse("-1").is_err());
        assert!(rate_limit::RefillPerSecond::parse("NaN").is_err());

        assert_eq!(batch::MaxSize::parse("10").unwrap(), 10);
        assert!(batch::MaxSize::parse("0").is_err());
        assert!(batch::MaxSize::parse("1000").is_err());

        assert_eq!(cache::Ttl::parse("60").unwrap(), Duration::from_secs(60));
        assert!(cache::Ttl::parse("0").is_err());
        assert!(web::Port::parse("0").is_err());
    }

    #[test]
    fn test_env_docs_list_every_section() {
        let docs = generate_env_docs();
        assert!(docs.contains("NAVER_DICT_CACHE_CAPACITY"));
        assert!(docs.contains("NAVER_DICT_RATE_LIMIT_REFILL_PER_SECOND"));
        assert!(docs.contains("NAVER_DICT_BATCH_MAX_CONCURRENCY"));
        assert!(docs.contains("NAVER_DICT_WEB_PORT"));
    }
}
