//  ██████╗  █████╗ ███████╗███████╗██╗███╗   ██╗ ██████╗
//  ██╔══██╗██╔══██╗██╔════╝██╔════╝██║████╗  ██║██╔════╝
//  ██████╔╝███████║███████╗███████╗██║██╔██╗ ██║██║  ███╗
//  ██╔═══╝ ██╔══██║╚════██║╚════██║██║██║╚██╗██║██║   ██║
//  ██║     ██║  ██║███████║███████║██║██║ ╚████║╚██████╔╝
//  ╚═╝     ╚═╝  ╚═╝╚══════╝╚══════╝╚═╝╚═╝  ╚═══╝ ╚═════╝

#![cfg(feature = "cli")]

use std::path::PathBuf;
use std::process::Command;

use assert_cmd::prelude::*;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("naver-dict-cli-{}-{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// 在空目录中运行，避免读到本地配置文件
fn naver_dict(dir: &PathBuf) -> Command {
    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap();
    cmd.current_dir(dir).env("NAVER_DICT_LOG_LEVEL", "error");
    cmd
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[cfg(test)]
mod passing {
    use super::*;

    #[test]
    fn env_docs() {
        let dir = scratch_dir("env-docs");
        let output = naver_dict(&dir).arg("env-docs").output().unwrap();

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("NAVER_DICT_CACHE_CAPACITY"));
        assert!(stdout.contains("NAVER_DICT_RATE_LIMIT_CAPACITY"));
    }

    #[test]
    fn generate_config() {
        let dir = scratch_dir("config");
        let path = dir.join("naver-dict.toml");

        naver_dict(&dir)
            .args(["config", path.to_str().unwrap()])
            .assert()
            .success();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("cache_capacity = 1000"));
        assert!(content.contains("batch_max_size = 10"));
    }
}

#[cfg(test)]
mod failing {
    use super::*;

    #[test]
    fn blank_word() {
        let dir = scratch_dir("blank");
        let output = naver_dict(&dir).args(["search", "   "]).output().unwrap();

        assert!(!output.status.success());
        let json = stdout_json(&output);
        assert_eq!(json["success"], false);
        assert_eq!(json["error_type"], "validation");
    }

    #[test]
    fn unknown_dict_type() {
        let dir = scratch_dir("dict");
        let output = naver_dict(&dir)
            .args(["search", "학교", "--dict", "fr"])
            .output()
            .unwrap();

        assert!(!output.status.success());
        assert_eq!(stdout_json(&output)["error_type"], "validation");
    }

    #[test]
    fn oversized_batch() {
        let dir = scratch_dir("batch");
        let mut cmd = naver_dict(&dir);
        cmd.arg("batch");
        for i in 0..11 {
            cmd.arg(format!("단어{}", i));
        }
        let output = cmd.output().unwrap();

        assert!(!output.status.success());
        let json = stdout_json(&output);
        assert_eq!(json["success"], false);
        assert_eq!(json["error_type"], "validation");
    }

    #[test]
    fn batch_without_words() {
        let dir = scratch_dir("empty");
        naver_dict(&dir).arg("batch").assert().failure();
    }
}
