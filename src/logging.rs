//! 日志初始化
//!
//! 两个可执行程序共用，级别来自 `NAVER_DICT_LOG_LEVEL`（默认 info）。
//! 日志输出到 stderr，stdout 只留给 JSON 结果。

use tracing::Level;

use crate::env::core::LogLevel;
use crate::env::EnvVar;

/// 把级别名转换为 `tracing::Level`
pub fn parse_level(name: &str) -> Level {
    match name {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// 安装 fmt 订阅器；重复调用时保持第一次的设置
pub fn init_logging() {
    let (level, invalid) = match LogLevel::get() {
        Ok(name) => (parse_level(&name), None),
        Err(e) => (Level::INFO, Some(e)),
    };

    let installed = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok();

    if let Some(e) = invalid {
        tracing::warn!("日志级别无效，使用 info: {}", e);
    }
    if installed {
        tracing::debug!("日志已初始化: level={}", level);
    }
}
