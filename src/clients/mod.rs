//! 外部服务客户端
//!
//! - `ContentProvider`：AI 服务（上传文件、查询状态、生成内容、删除文件）
//! - `QuizStore`：数据存储（文件桶 + quizzes / questions 两张表）
//!
//! 两个 trait 只描述能力，具体实现见 `GeminiClient` 和 `SupabaseClient`

pub mod gemini_client;
pub mod supabase_client;

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{ProviderError, StoreError};
use crate::models::{NewQuestion, NewQuiz, QuestionRow, Quiz};

pub use gemini_client::GeminiClient;
pub use supabase_client::SupabaseClient;

/// AI 服务侧文件的处理状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileState {
    #[serde(alias = "STATE_UNSPECIFIED")]
    Unspecified,
    Processing,
    Active,
    Failed,
}

impl Default for FileState {
    fn default() -> Self {
        FileState::Unspecified
    }
}

/// AI 服务侧的文件句柄
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderFile {
    /// 形如 `files/abc123`
    pub name: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub state: FileState,
}

/// AI 服务能力
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// 上传本地文件
    async fn upload_file(
        &self,
        path: &Path,
        mime_type: &str,
        display_name: &str,
    ) -> Result<ProviderFile, ProviderError>;

    /// 查询文件状态
    async fn get_file(&self, name: &str) -> Result<ProviderFile, ProviderError>;

    /// 以文件 + 提示词生成文本
    async fn generate(&self, file: &ProviderFile, prompt: &str) -> Result<String, ProviderError>;

    /// 删除文件
    async fn delete_file(&self, name: &str) -> Result<(), ProviderError>;
}

/// 数据存储能力
#[async_trait]
pub trait QuizStore: Send + Sync {
    /// 上传原始文件到存储桶
    async fn upload_blob(
        &self,
        name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError>;

    /// 插入测验，返回带 id 的记录
    async fn insert_quiz(&self, quiz: &NewQuiz) -> Result<Quiz, StoreError>;

    /// 一次请求批量插入题目
    async fn insert_questions(
        &self,
        questions: &[NewQuestion],
    ) -> Result<Vec<QuestionRow>, StoreError>;

    /// 删除测验（补偿用）
    async fn delete_quiz(&self, quiz_id: i64) -> Result<(), StoreError>;

    async fn get_quiz(&self, quiz_id: i64) -> Result<Option<Quiz>, StoreError>;

    /// 按 question_number 升序
    async fn list_questions(&self, quiz_id: i64) -> Result<Vec<QuestionRow>, StoreError>;

    /// 按 created_at 降序
    async fn recent_quizzes(&self, limit: usize) -> Result<Vec<Quiz>, StoreError>;
}
