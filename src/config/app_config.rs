//! 应用配置管理
//!
//! 配置在进程启动时从环境变量（以及可选的 `.env` 文件）读取一次，
//! 之后以 `Arc<AppConfig>` 只读共享，不再修改。

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

use crate::llm::{fix_base_url, normalize_model};
use crate::utils::request_logger::RequestLogger;

pub const ENV_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_MODEL: &str = "GEMINI_MODEL";
pub const ENV_BASE_URL: &str = "GEMINI_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "GEMINI_TIMEOUT_SECS";
pub const ENV_MAX_CATEGORY_CHARS: &str = "IDEA_MAX_CATEGORY_CHARS";
pub const ENV_REQUEST_LOG_DIR: &str = "IDEA_REQUEST_LOG_DIR";
pub const ENV_BIND_ADDR: &str = "IDEA_PROXY_ADDR";

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?} ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// 应用配置结构体
#[derive(Clone)]
pub struct AppConfig {
    /// Gemini API 密钥，空字符串表示未设置
    pub api_key: String,

    /// Gemini API 基础 URL
    pub base_url: String,

    /// 模型 ID
    pub model: String,

    /// 上游请求超时（秒）
    pub timeout_secs: u64,

    /// category 最大字符数，0 表示不限制
    pub max_category_chars: usize,

    /// 上游调用 JSONL 日志目录，未设置则不写文件
    pub request_log_dir: Option<PathBuf>,

    /// 监听地址
    pub bind_addr: SocketAddr,
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_max_category_chars() -> usize {
    200
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8765))
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            max_category_chars: default_max_category_chars(),
            request_log_dir: None,
            bind_addr: default_bind_addr(),
        }
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &RequestLogger::mask_api_key(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_category_chars", &self.max_category_chars)
            .field("request_log_dir", &self.request_log_dir)
            .field("bind_addr", &self.bind_addr)
            .finish()
    }
}

impl AppConfig {
    /// 从进程环境变量加载
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 从任意查找函数加载，便于测试
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();

        if let Some(api_key) = get(ENV_API_KEY) {
            config.api_key = api_key;
        }
        if let Some(base_url) = get(ENV_BASE_URL) {
            config.base_url = fix_base_url(&base_url);
        }
        if let Some(model) = get(ENV_MODEL) {
            config.model = normalize_model(&model);
        }
        if let Some(value) = get(ENV_TIMEOUT_SECS) {
            config.timeout_secs = parse_var(ENV_TIMEOUT_SECS, &value)?;
            if config.timeout_secs == 0 {
                return Err(ConfigError::InvalidValue {
                    var: ENV_TIMEOUT_SECS,
                    value,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }
        if let Some(value) = get(ENV_MAX_CATEGORY_CHARS) {
            config.max_category_chars = parse_var(ENV_MAX_CATEGORY_CHARS, &value)?;
        }
        if let Some(dir) = get(ENV_REQUEST_LOG_DIR) {
            config.request_log_dir = Some(PathBuf::from(dir));
        }
        if let Some(value) = get(ENV_BIND_ADDR) {
            config.bind_addr = parse_var(ENV_BIND_ADDR, &value)?;
        }

        Ok(config)
    }

    /// 是否已设置 API 密钥
    pub fn api_key_set(&self) -> bool {
        !self.api_key.is_empty()
    }
}

fn parse_var<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        var,
        value: value.to_string(),
        reason: e.to_string(),
    })
}
