use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// 应用程序错误类型
///
/// 按照"谁的锅"分类，路由层据此映射 HTTP 状态码
#[derive(Debug, Error)]
pub enum AppError {
    /// 请求参数不合法（400）
    #[error("参数错误: {0}")]
    Validation(String),
    /// 资源不存在（404）
    #[error("未找到: {0}")]
    NotFound(String),
    /// AI 服务错误
    #[error("AI 服务错误: {0}")]
    Provider(#[from] ProviderError),
    /// 数据存储错误
    #[error("数据存储错误: {0}")]
    Store(#[from] StoreError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 其他内部错误
    #[error("内部错误: {0}")]
    Internal(String),
}

/// AI 服务（Gemini）相关错误
#[derive(Debug, Error)]
pub enum ProviderError {
    /// 网络请求失败
    #[error("请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// 返回非 2xx 状态码
    #[error("返回错误响应 ({endpoint}): status={status}, body={body}")]
    BadStatus {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// 文件处理失败
    #[error("文件处理失败: {name}")]
    ProcessingFailed { name: String },
    /// 等待文件处理超时
    #[error("等待文件处理超时 ({name}), 已等待 {waited_secs} 秒")]
    ProcessingTimedOut { name: String, waited_secs: u64 },
    /// 服务正在关闭，等待被取消
    #[error("等待文件处理被取消: {name}")]
    Cancelled { name: String },
    /// 返回结果为空
    #[error("返回内容为空 (模型: {model})")]
    EmptyResponse { model: String },
    /// 生成结果不是合法的 JSON
    #[error("无法解析生成的题目 JSON: {source}")]
    MalformedMcqJson {
        #[source]
        source: serde_json::Error,
    },
    /// 生成结果内容不符合要求
    #[error("生成的题目不符合要求: {0}")]
    InvalidMcqContent(String),
    /// 本地临时文件读写失败
    #[error("临时文件操作失败: {0}")]
    TempFile(#[from] std::io::Error),
}

/// 数据存储（Supabase）相关错误
#[derive(Debug, Error)]
pub enum StoreError {
    /// 网络请求失败
    #[error("请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// 返回非 2xx 状态码
    #[error("返回错误响应 ({endpoint}): status={status}, body={body}")]
    BadStatus {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// 存储地址无法拼接
    #[error("无效的 Supabase 地址: {url}")]
    InvalidUrl { url: String },
    /// 插入后没有返回记录
    #[error("插入 {table} 后未返回任何记录")]
    EmptyInsert { table: String },
    /// 返回的数据结构和预期不一致
    #[error("无法解析 {table} 返回的数据: {source}")]
    UnexpectedRow {
        table: String,
        #[source]
        source: reqwest::Error,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 必需的环境变量不存在
    #[error("环境变量 {var_name} 不存在")]
    EnvVarNotFound { var_name: String },
    /// 配置文件读取或解析失败
    #[error("配置文件 {path} 无效: {message}")]
    FileInvalid { path: String, message: String },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建参数错误
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    /// 创建资源不存在错误
    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    /// 对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Provider(_) | AppError::Store(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 返回给客户端的错误码
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "invalid_parameter",
            AppError::NotFound(_) => "not_found",
            AppError::Provider(_) | AppError::Store(_) => "upstream_failure",
            AppError::Config(_) | AppError::Internal(_) => "internal_server_error",
        }
    }

    /// 返回给客户端的错误信息
    ///
    /// 上游错误只说明是哪一方出错，细节只写日志
    fn public_message(&self) -> String {
        match self {
            AppError::Validation(msg) | AppError::NotFound(msg) => msg.clone(),
            AppError::Provider(_) => "AI provider request failed".to_string(),
            AppError::Store(_) => "Data store request failed".to_string(),
            AppError::Config(_) | AppError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

// ========== 请求解析失败 ==========

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::validation(format!("Invalid path parameter: {}", rejection.body_text()))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::validation(format!("Invalid JSON body: {}", rejection.body_text()))
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::validation(format!("Invalid multipart body: {}", rejection.body_text()))
    }
}

/// 错误响应体
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("❌ 请求处理失败: {}", self);
        }

        let body = ErrorBody {
            error: self.code(),
            message: self.public_message(),
        };

        (status, Json(body)).into_response()
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
