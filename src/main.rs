//! Naver Dict 命令行工具
//!
//! 查询结果以格式化 JSON 输出到 stdout，日志输出到 stderr。

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use naver_dict::dictionary::config::{load_dict_config, ConfigManager};
use naver_dict::dictionary::responses::to_pretty_json;
use naver_dict::dictionary::{DictConfig, DictResult, DictType, DictionaryService, LookupFailure};
use naver_dict::env::generate_env_docs;

#[derive(Parser)]
#[command(name = "naver-dict", version)]
#[command(about = "Naver 韩语词典查询（带缓存、限流与批量去重）", long_about = None)]
struct Cli {
    /// 配置文件路径（TOML 或 JSON），缺省时按搜索路径查找
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 查询单个词
    Search {
        /// 要查询的词
        word: String,

        /// 词典类型: ko-zh 或 ko-en
        #[arg(short, long, default_value = "ko-zh")]
        dict: String,
    },

    /// 批量查询（重复的词只查询一次）
    Batch {
        /// 要查询的词
        #[arg(required = true)]
        words: Vec<String>,

        /// 词典类型: ko-zh 或 ko-en
        #[arg(short, long, default_value = "ko-zh")]
        dict: String,

        /// 缓存命中时直接返回缓存原文
        #[arg(long)]
        raw_cached: bool,
    },

    /// 生成示例配置文件
    Config {
        /// 输出路径
        path: String,
    },

    /// 输出环境变量文档
    EnvDocs,
}

fn load_config(path: Option<&str>) -> DictResult<DictConfig> {
    match path {
        Some(path) => Ok(ConfigManager::from_file(path)?.into_config()),
        None => Ok(load_dict_config()),
    }
}

fn print_failure(word: &str, error: &naver_dict::DictError) {
    let word = word.trim();
    println!(
        "{}",
        to_pretty_json(&LookupFailure::from_error(word, word, error, false, None))
    );
}

#[tokio::main]
async fn main() -> ExitCode {
    naver_dict::logging::init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Config { path } => match ConfigManager::generate_example_config(&path) {
            Ok(()) => {
                eprintln!("示例配置已写入: {}", path);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{}", e);
                ExitCode::FAILURE
            }
        },

        Commands::EnvDocs => {
            println!("{}", generate_env_docs());
            ExitCode::SUCCESS
        }

        Commands::Search { word, dict } => {
            let service = match load_config(cli.config.as_deref()).and_then(DictionaryService::new)
            {
                Ok(service) => service,
                Err(e) => {
                    print_failure(&word, &e);
                    return ExitCode::FAILURE;
                }
            };
            let dict_type = match dict.parse::<DictType>() {
                Ok(dict_type) => dict_type,
                Err(e) => {
                    print_failure(&word, &e);
                    return ExitCode::FAILURE;
                }
            };

            match service.lookup(&word, dict_type).await {
                Ok(response) => {
                    println!("{}", to_pretty_json(&response));
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    print_failure(&word, &e);
                    ExitCode::FAILURE
                }
            }
        }

        Commands::Batch {
            words,
            dict,
            raw_cached,
        } => {
            let result = match load_config(cli.config.as_deref()).and_then(DictionaryService::new) {
                Ok(service) => match dict.parse::<DictType>() {
                    Ok(dict_type) => service.batch_lookup(&words, dict_type, raw_cached).await,
                    Err(e) => Err(e),
                },
                Err(e) => Err(e),
            };

            match result {
                Ok(response) => {
                    println!("{}", to_pretty_json(&response));
                    if response.success_count > 0 {
                        ExitCode::SUCCESS
                    } else {
                        ExitCode::FAILURE
                    }
                }
                Err(e) => {
                    println!(
                        "{}",
                        to_pretty_json(&serde_json::json!({
                            "success": false,
                            "error": e.to_string(),
                            "error_type": e.kind(),
                            "details": e.details(),
                        }))
                    );
                    ExitCode::FAILURE
                }
            }
        }
    }
}
