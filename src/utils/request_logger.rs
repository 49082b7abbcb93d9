//! 上游请求日志记录器
//!
//! 把每次 Gemini 调用记录到 JSONL 文件，便于排查问题。只写服务端磁盘，从不返回给客户端。

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::warn;
use uuid::Uuid;

/// 请求日志条目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// 请求 ID
    pub request_id: String,
    /// 时间戳
    pub timestamp: DateTime<Utc>,
    /// 端点 URL（不含密钥）
    pub endpoint: String,
    /// API 密钥（脱敏）
    pub api_key_masked: String,
    /// 模型名称
    pub model: String,
    /// 请求的 category
    pub category: String,
    /// prompt 预览
    pub prompt_preview: String,
    /// 超时时间（秒）
    pub timeout: u64,
    /// 状态
    pub status: String,
    /// 持续时间（毫秒）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// 返回的 idea 预览
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idea_preview: Option<String>,
    /// 错误类型
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// 错误信息
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// HTTP 状态码
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

/// 按字符截断字符串
pub fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        None => s.to_string(),
        Some((idx, _)) => format!("{}...", &s[..idx]),
    }
}

/// 已打开的日志文件及自上次清理以来的写入次数
#[derive(Default)]
struct LogFile {
    file: Option<File>,
    writes_since_cleanup: usize,
}

/// 请求日志记录器
///
/// 每次只追加一行；超过上限的旧条目每 `cleanup_interval` 次写入才清理一次。
pub struct RequestLogger {
    log_path: PathBuf,
    max_entries: usize,
    cleanup_interval: usize,
    file: Mutex<LogFile>,
}

impl RequestLogger {
    /// 创建新的日志记录器
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        let log_dir = log_dir.into();

        // 确保目录存在
        if let Err(e) = fs::create_dir_all(&log_dir) {
            warn!("Failed to create request log dir {}: {}", log_dir.display(), e);
        }

        Self {
            log_path: log_dir.join("upstream_requests.jsonl"),
            max_entries: 1000,
            cleanup_interval: 100,
            file: Mutex::new(LogFile::default()),
        }
    }

    /// 日志文件路径
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// 生成请求 ID
    pub fn generate_request_id() -> String {
        Uuid::new_v4().to_string()[..8].to_string()
    }

    /// API 密钥脱敏
    pub fn mask_api_key(api_key: &str) -> String {
        let chars: Vec<char> = api_key.chars().collect();
        if chars.len() <= 8 {
            "*".repeat(chars.len())
        } else {
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("{}...{}", head, tail)
        }
    }

    /// 记录请求开始
    pub fn log_request(
        &self,
        request_id: &str,
        endpoint: &str,
        model: &str,
        category: &str,
        prompt: &str,
        timeout: u64,
        api_key: &str,
    ) -> LogEntry {
        LogEntry {
            request_id: request_id.to_string(),
            timestamp: Utc::now(),
            endpoint: endpoint.to_string(),
            api_key_masked: Self::mask_api_key(api_key),
            model: model.to_string(),
            category: truncate(category, 200),
            prompt_preview: truncate(prompt, 300),
            timeout,
            status: "pending".to_string(),
            duration_ms: None,
            idea_preview: None,
            error_type: None,
            error_message: None,
            status_code: None,
        }
    }

    /// 记录成功
    pub fn log_success(&self, mut entry: LogEntry, start_time: Instant, idea: &str) {
        entry.status = "success".to_string();
        entry.duration_ms = Some(start_time.elapsed().as_millis() as u64);
        entry.idea_preview = Some(truncate(idea, 300));
        entry.status_code = Some(200);
        self.write_entry(&entry);
    }

    /// 记录错误
    pub fn log_error(
        &self,
        mut entry: LogEntry,
        start_time: Instant,
        error_type: &str,
        error_message: &str,
        status_code: Option<u16>,
    ) {
        entry.status = "error".to_string();
        entry.duration_ms = Some(start_time.elapsed().as_millis() as u64);
        entry.error_type = Some(error_type.to_string());
        entry.error_message = Some(truncate(error_message, 500));
        entry.status_code = status_code;
        self.write_entry(&entry);
    }

    /// 写入日志条目
    fn write_entry(&self, entry: &LogEntry) {
        let json = match serde_json::to_string(entry) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize request log entry: {}", e);
                return;
            }
        };

        let mut log_file = self.file.lock();

        // 懒加载文件
        if log_file.file.is_none() {
            match OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.log_path)
            {
                Ok(f) => log_file.file = Some(f),
                Err(e) => warn!("Failed to open request log {}: {}", self.log_path.display(), e),
            }
        }

        if let Some(file) = log_file.file.as_mut() {
            let _ = writeln!(file, "{}", json);
            let _ = file.flush();
        }

        log_file.writes_since_cleanup += 1;
        if log_file.writes_since_cleanup >= self.cleanup_interval {
            log_file.writes_since_cleanup = 0;
            self.cleanup_if_needed();
        }
    }

    /// 清理旧日志，调用时持有文件锁
    fn cleanup_if_needed(&self) {
        if let Ok(file) = File::open(&self.log_path) {
            let reader = BufReader::new(file);
            let lines: Vec<String> = reader.lines().map_while(Result::ok).collect();

            if lines.len() > self.max_entries {
                let keep_lines = &lines[lines.len() - self.max_entries..];
                if let Ok(mut file) = File::create(&self.log_path) {
                    for line in keep_lines {
                        let _ = writeln!(file, "{}", line);
                    }
                }
            }
        }
    }
}
