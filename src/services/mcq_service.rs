//! 选择题生成服务 - 业务能力层
//!
//! 只负责"把一个文件变成 N 道选择题"，不关心存储
//!
//! 流程：
//! 1. 写入临时文件
//! 2. 上传到 AI 服务
//! 3. 轮询直到文件处理完成（有最长等待时间，可被关闭信号取消）
//! 4. 生成题目并解析 JSON
//! 5. 无论成功失败都清理临时文件和 AI 服务侧的文件

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use regex::Regex;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::clients::{ContentProvider, FileState, ProviderFile};
use crate::config::Config;
use crate::error::ProviderError;
use crate::models::{Mcq, SourceKind};
use crate::utils::logging::truncate_text;

/// 选择题生成服务
#[derive(Clone)]
pub struct McqService {
    provider: Arc<dyn ContentProvider>,
    poll_interval: Duration,
    max_wait: Duration,
}

impl McqService {
    /// 创建新的生成服务
    pub fn new(provider: Arc<dyn ContentProvider>, config: &Config) -> Self {
        Self::with_timing(
            provider,
            config.provider_poll_interval,
            config.provider_max_wait,
        )
    }

    /// 指定轮询间隔和最长等待时间
    pub fn with_timing(
        provider: Arc<dyn ContentProvider>,
        poll_interval: Duration,
        max_wait: Duration,
    ) -> Self {
        Self {
            provider,
            poll_interval,
            max_wait,
        }
    }

    /// 从上传的文件生成选择题
    ///
    /// # 参数
    /// - `bytes`: 文件内容
    /// - `file_name`: 原始文件名（作为 AI 服务侧的显示名）
    /// - `kind`: 文件类型
    /// - `num_questions`: 题目数量，调用方保证在 1..=20 之间
    /// - `shutdown`: 关闭信号，变为 `true` 时停止等待
    ///
    /// # 返回
    /// 恰好 `num_questions` 道题
    pub async fn generate(
        &self,
        bytes: &[u8],
        file_name: &str,
        kind: SourceKind,
        num_questions: usize,
        shutdown: watch::Receiver<bool>,
    ) -> Result<Vec<Mcq>, ProviderError> {
        // 临时文件在 drop 时删除，覆盖所有返回路径
        let temp_file = tempfile::Builder::new()
            .prefix("mcq-upload-")
            .suffix(kind.extension())
            .tempfile()?;
        tokio::fs::write(temp_file.path(), bytes).await?;

        let uploaded = self
            .provider
            .upload_file(temp_file.path(), kind.mime_type(), file_name)
            .await?;
        info!("✓ 文件已上传到 AI 服务: {}", uploaded.name);

        // 请求中途被丢弃时由 guard 在后台删除
        let guard = RemoteFileGuard::new(self.provider.clone(), uploaded.name.clone());

        let result = self
            .generate_from_file(uploaded, num_questions, shutdown)
            .await;

        guard.release().await;
        drop(temp_file);

        result
    }

    async fn generate_from_file(
        &self,
        uploaded: ProviderFile,
        num_questions: usize,
        shutdown: watch::Receiver<bool>,
    ) -> Result<Vec<Mcq>, ProviderError> {
        let ready = self.wait_until_ready(uploaded, shutdown).await?;

        let prompt = build_mcq_prompt(num_questions);
        let response = self.provider.generate(&ready, &prompt).await?;
        debug!("AI 返回内容: {}", truncate_text(&response, 200));

        parse_mcqs(&response, num_questions)
    }

    /// 轮询文件状态，直到离开 PROCESSING
    async fn wait_until_ready(
        &self,
        file: ProviderFile,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<ProviderFile, ProviderError> {
        let name = file.name.clone();
        let name_ref = name.as_str();
        let shutdown_ref = &mut shutdown;

        let poll = async move {
            let mut current = file;
            loop {
                match current.state {
                    FileState::Processing => {}
                    FileState::Failed => {
                        return Err(ProviderError::ProcessingFailed {
                            name: name_ref.to_string(),
                        })
                    }
                    FileState::Active | FileState::Unspecified => return Ok(current),
                }

                debug!("文件 {} 仍在处理中，{:?} 后重试", name_ref, self.poll_interval);

                tokio::select! {
                    _ = tokio::time::sleep(self.poll_interval) => {}
                    _ = shutdown_requested(shutdown_ref) => {
                        return Err(ProviderError::Cancelled { name: name_ref.to_string() });
                    }
                }

                current = self.provider.get_file(name_ref).await?;
            }
        };

        let outcome = tokio::time::timeout(self.max_wait, poll).await;
        match outcome {
            Ok(result) => result,
            Err(_) => Err(ProviderError::ProcessingTimedOut {
                name,
                waited_secs: self.max_wait.as_secs(),
            }),
        }
    }
}

/// AI 服务侧文件的清理句柄
///
/// 正常路径调用 `release` 同步删除；未调用就被 drop 时在后台任务中删除
struct RemoteFileGuard {
    provider: Arc<dyn ContentProvider>,
    name: Option<String>,
}

impl RemoteFileGuard {
    fn new(provider: Arc<dyn ContentProvider>, name: String) -> Self {
        Self {
            provider,
            name: Some(name),
        }
    }

    async fn release(mut self) {
        if let Some(name) = self.name.take() {
            delete_remote_file(self.provider.as_ref(), &name).await;
        }
    }
}

impl Drop for RemoteFileGuard {
    fn drop(&mut self) {
        let Some(name) = self.name.take() else {
            return;
        };
        let provider = self.provider.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                debug!("请求已取消，后台删除 AI 服务侧文件: {}", name);
                handle.spawn(async move {
                    delete_remote_file(provider.as_ref(), &name).await;
                });
            }
            Err(_) => warn!("⚠️ 没有可用的运行时，无法删除 AI 服务侧文件: {}", name),
        }
    }
}

async fn delete_remote_file(provider: &dyn ContentProvider, name: &str) {
    if let Err(e) = provider.delete_file(name).await {
        warn!("⚠️ 删除 AI 服务侧文件失败 {}: {}", name, e);
    }
}

/// 等待关闭信号；发送端已释放时永远等待
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// 构建生成选择题的提示词
pub fn build_mcq_prompt(num_questions: usize) -> String {
    format!(
        r#"Read the attached content and write exactly {n} multiple-choice questions (MCQs) about it.

Rules:
1. Cover different parts of the content instead of repeating one topic
2. Every question has exactly four options labelled A, B, C and D
3. Exactly one option is correct
4. Questions should be challenging but fair; skip trivial ones

Reply with a JSON array only, using this structure:
[
    {{
        "question": "Question text?",
        "options": {{
            "A": "First option",
            "B": "Second option",
            "C": "Third option",
            "D": "Fourth option"
        }},
        "correct_answer": "A",
        "explanation": "Short reason why the answer is correct"
    }}
]

The array must contain exactly {n} items."#,
        n = num_questions
    )
}

/// 去掉 Markdown 代码块包裹
pub fn strip_code_fence(text: &str) -> &str {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let fence = FENCE.get_or_init(|| {
        Regex::new(r"(?s)^```[A-Za-z]*\s*(.*?)\s*```$").expect("code fence regex is valid")
    });

    let trimmed = text.trim();
    match fence.captures(trimmed).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => trimmed,
    }
}

/// 解析 AI 返回的题目数组并检查数量
pub fn parse_mcqs(text: &str, expected: usize) -> Result<Vec<Mcq>, ProviderError> {
    let body = strip_code_fence(text);
    let mcqs: Vec<Mcq> =
        serde_json::from_str(body).map_err(|source| ProviderError::MalformedMcqJson { source })?;

    if mcqs.len() != expected {
        return Err(ProviderError::InvalidMcqContent(format!(
            "要求 {} 道题，实际返回 {} 道",
            expected,
            mcqs.len()
        )));
    }

    if let Some(index) = mcqs.iter().position(|m| m.question.trim().is_empty()) {
        return Err(ProviderError::InvalidMcqContent(format!(
            "第 {} 道题题干为空",
            index + 1
        )));
    }

    Ok(mcqs)
}
