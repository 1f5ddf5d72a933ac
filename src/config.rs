use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// 指定 TOML 配置文件路径的环境变量
pub const CONFIG_FILE_ENV: &str = "MCQ_CONFIG_FILE";

/// 程序配置
///
/// 密钥类配置没有默认值，必须来自配置文件或环境变量
#[derive(Clone, Debug)]
pub struct Config {
    /// 监听地址
    pub listen_addr: String,
    /// 允许跨域的前端地址
    pub cors_origin: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 上传文件大小上限（字节）
    pub max_upload_bytes: usize,
    // --- Gemini 配置 ---
    pub gemini_api_key: String,
    pub gemini_api_base_url: String,
    pub gemini_model_name: String,
    /// 轮询文件处理状态的间隔
    pub provider_poll_interval: Duration,
    /// 等待文件处理的最长时间
    pub provider_max_wait: Duration,
    // --- Supabase 配置 ---
    pub supabase_url: String,
    pub supabase_key: String,
    pub supabase_bucket: String,
}

/// TOML 配置文件结构，所有字段可选
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub listen_addr: Option<String>,
    pub cors_origin: Option<String>,
    pub verbose_logging: Option<bool>,
    pub max_upload_bytes: Option<usize>,
    pub gemini_api_key: Option<String>,
    pub gemini_api_base_url: Option<String>,
    pub gemini_model_name: Option<String>,
    pub provider_poll_interval_secs: Option<u64>,
    pub provider_max_wait_secs: Option<u64>,
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
    pub supabase_bucket: Option<String>,
}

/// 环境变量优先，为空时退回配置文件中的值
fn layered_string(var_name: &str, from_file: &Option<String>) -> Option<String> {
    std::env::var(var_name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .or_else(|| from_file.clone())
}

fn required_string(var_name: &str, from_file: &Option<String>) -> Result<String, ConfigError> {
    layered_string(var_name, from_file).ok_or_else(|| ConfigError::EnvVarNotFound {
        var_name: var_name.to_string(),
    })
}

fn layered_parsed<T: std::str::FromStr>(
    var_name: &str,
    expected_type: &str,
    from_file: Option<T>,
) -> Result<Option<T>, ConfigError> {
    match std::env::var(var_name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
        _ => Ok(from_file),
    }
}

impl Config {
    pub const DEFAULT_LISTEN_ADDR: &'static str = "0.0.0.0:8001";
    pub const DEFAULT_CORS_ORIGIN: &'static str = "http://localhost:3000";
    pub const DEFAULT_GEMINI_API_BASE_URL: &'static str =
        "https://generativelanguage.googleapis.com";
    pub const DEFAULT_GEMINI_MODEL_NAME: &'static str = "gemini-2.0-flash-exp";
    pub const DEFAULT_SUPABASE_BUCKET: &'static str = "mcq-files";
    pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;
    pub const DEFAULT_MAX_WAIT_SECS: u64 = 300;
    pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

    /// 加载配置：默认值 → TOML 文件（可选）→ 环境变量
    pub fn load() -> Result<Self, ConfigError> {
        let file = match std::env::var(CONFIG_FILE_ENV) {
            Ok(path) if !path.trim().is_empty() => FileConfig::from_path(Path::new(&path))?,
            _ => FileConfig::default(),
        };
        Self::from_layers(file)
    }

    fn from_layers(f: FileConfig) -> Result<Self, ConfigError> {
        let poll_secs = layered_parsed(
            "PROVIDER_POLL_INTERVAL_SECS",
            "u64",
            f.provider_poll_interval_secs,
        )?
        .unwrap_or(Self::DEFAULT_POLL_INTERVAL_SECS);
        let max_wait_secs =
            layered_parsed("PROVIDER_MAX_WAIT_SECS", "u64", f.provider_max_wait_secs)?
                .unwrap_or(Self::DEFAULT_MAX_WAIT_SECS);

        Ok(Self {
            listen_addr: layered_string("LISTEN_ADDR", &f.listen_addr)
                .unwrap_or_else(|| Self::DEFAULT_LISTEN_ADDR.to_string()),
            cors_origin: layered_string("CORS_ORIGIN", &f.cors_origin)
                .unwrap_or_else(|| Self::DEFAULT_CORS_ORIGIN.to_string()),
            verbose_logging: layered_parsed("VERBOSE_LOGGING", "bool", f.verbose_logging)?
                .unwrap_or(false),
            max_upload_bytes: layered_parsed("MAX_UPLOAD_BYTES", "usize", f.max_upload_bytes)?
                .unwrap_or(Self::DEFAULT_MAX_UPLOAD_BYTES),
            gemini_api_key: required_string("GEMINI_API_KEY", &f.gemini_api_key)?,
            gemini_api_base_url: layered_string("GEMINI_API_BASE_URL", &f.gemini_api_base_url)
                .unwrap_or_else(|| Self::DEFAULT_GEMINI_API_BASE_URL.to_string()),
            gemini_model_name: layered_string("GEMINI_MODEL_NAME", &f.gemini_model_name)
                .unwrap_or_else(|| Self::DEFAULT_GEMINI_MODEL_NAME.to_string()),
            provider_poll_interval: Duration::from_secs(poll_secs.max(1)),
            provider_max_wait: Duration::from_secs(max_wait_secs),
            supabase_url: required_string("SUPABASE_URL", &f.supabase_url)?,
            supabase_key: required_string("SUPABASE_KEY", &f.supabase_key)?,
            supabase_bucket: layered_string("SUPABASE_BUCKET", &f.supabase_bucket)
                .unwrap_or_else(|| Self::DEFAULT_SUPABASE_BUCKET.to_string()),
        })
    }
}

impl FileConfig {
    /// 从 TOML 文件读取
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileInvalid {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            ConfigError::FileInvalid { message, .. } => ConfigError::FileInvalid {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    /// 解析 TOML 文本
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::FileInvalid {
            path: String::new(),
            message: e.to_string(),
        })
    }
}
