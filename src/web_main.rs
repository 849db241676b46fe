//! Web 服务器主程序入口

#[cfg(feature = "web")]
use std::sync::Arc;

#[cfg(feature = "web")]
use naver_dict::dictionary::{config::load_dict_config, DictionaryService};
#[cfg(feature = "web")]
use naver_dict::web::{WebConfig, WebServer};

#[cfg(feature = "web")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    naver_dict::logging::init_logging();

    // 环境变量提供默认值，命令行参数优先
    let mut web_config = WebConfig::default();

    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--bind" | "-b" => {
                if i + 1 < args.len() {
                    web_config.bind_addr = args[i + 1].clone();
                    i += 2;
                } else {
                    eprintln!("Error: --bind requires an address");
                    std::process::exit(1);
                }
            }
            "--port" | "-p" => {
                if i + 1 < args.len() {
                    web_config.port = args[i + 1].parse().unwrap_or_else(|_| {
                        eprintln!("Error: Invalid port number");
                        std::process::exit(1);
                    });
                    i += 2;
                } else {
                    eprintln!("Error: --port requires a port number");
                    std::process::exit(1);
                }
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            _ => {
                eprintln!("Error: Unknown argument: {}", args[i]);
                print_help();
                std::process::exit(1);
            }
        }
    }

    let service = Arc::new(DictionaryService::new(load_dict_config())?);

    let server = WebServer::new(web_config, service);
    server.start().await?;

    Ok(())
}

#[cfg(feature = "web")]
fn print_help() {
    println!("Naver Dict Web Server");
    println!();
    println!("USAGE:");
    println!("    naver-dict-web [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -b, --bind <ADDRESS>     Bind address [default: 127.0.0.1]");
    println!("    -p, --port <PORT>        Port number [default: 8000]");
    println!("    -h, --help               Print help information");
    println!();
    println!("EXAMPLES:");
    println!("    naver-dict-web");
    println!("    naver-dict-web --bind 0.0.0.0 --port 3000");
}

#[cfg(not(feature = "web"))]
fn main() {
    eprintln!("Error: Web feature not enabled. Please compile with --features web");
    std::process::exit(1);
}
