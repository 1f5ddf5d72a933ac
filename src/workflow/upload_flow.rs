//! 上传处理流程 - 流程层
//!
//! 核心职责：定义"一次上传"的完整处理流程
//!
//! 流程顺序：
//! 1. 上传原始文件到存储桶（失败只记日志）
//! 2. AI 生成选择题
//! 3. 保存测验和题目

use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::AppResult;
use crate::services::{McqService, QuizService};
use crate::workflow::upload_ctx::UploadCtx;

/// 上传处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UploadOutcome {
    pub quiz_id: i64,
    pub total_questions: usize,
}

/// 上传处理流程
///
/// - 编排存储、生成、保存三个步骤
/// - 不持有任何请求数据
/// - 只依赖业务能力（services）
#[derive(Clone)]
pub struct UploadFlow {
    mcq_service: McqService,
    quiz_service: QuizService,
}

impl UploadFlow {
    /// 创建新的上传处理流程
    pub fn new(mcq_service: McqService, quiz_service: QuizService) -> Self {
        Self {
            mcq_service,
            quiz_service,
        }
    }

    pub async fn run(
        &self,
        ctx: &UploadCtx,
        bytes: Vec<u8>,
        shutdown: watch::Receiver<bool>,
    ) -> AppResult<UploadOutcome> {
        info!("{} 📥 收到文件 {} ({} 字节)", ctx, ctx.original_name, bytes.len());

        // ========== 步骤 1: 存储原始文件 ==========
        if let Err(e) = self
            .quiz_service
            .upload_source(&ctx.storage_name, bytes.clone(), ctx.kind.mime_type())
            .await
        {
            warn!("{} ⚠️ 原始文件存储失败，继续生成: {}", ctx, e);
        }

        // ========== 步骤 2: 生成选择题 ==========
        info!("{} 🤖 正在生成 {} 道选择题...", ctx, ctx.num_questions);
        let mcqs = self
            .mcq_service
            .generate(
                &bytes,
                &ctx.original_name,
                ctx.kind,
                ctx.num_questions,
                shutdown,
            )
            .await?;
        info!("{} ✓ 已生成 {} 道选择题", ctx, mcqs.len());

        // ========== 步骤 3: 保存 ==========
        let quiz_id = self
            .quiz_service
            .persist(&mcqs, &ctx.storage_name, &ctx.original_name)
            .await?;
        info!("{} ✓ 已保存为测验 #{}", ctx, quiz_id);

        Ok(UploadOutcome {
            quiz_id,
            total_questions: mcqs.len(),
        })
    }
}
