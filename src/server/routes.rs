//! 路由处理函数
//!
//! 只做参数校验和结果转换，业务交给 workflow / services

use std::collections::HashMap;

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Multipart, Path, State};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use super::state::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{Quiz, QuizDetail, SourceKind, SubmitReport};
use crate::workflow::UploadCtx;

/// 未指定时的题目数量
pub const DEFAULT_NUM_QUESTIONS: i64 = 5;
pub const MIN_NUM_QUESTIONS: i64 = 1;
pub const MAX_NUM_QUESTIONS: i64 = 20;

const FILE_FIELD: &str = "file";
const NUM_QUESTIONS_FIELD: &str = "num_questions";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: &'static str,
    pub quiz_id: i64,
    pub total_questions: usize,
}

#[derive(Debug, Serialize)]
pub struct RecentQuizzesResponse {
    pub quizzes: Vec<Quiz>,
}

/// 已读取的上传文件
struct UploadedFile {
    name: String,
    kind: SourceKind,
    bytes: Vec<u8>,
}

/// GET /
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "MCQ Generator API is running" }))
}

/// POST /upload
pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<UploadResponse>> {
    let mut multipart = multipart?;
    let mut num_questions: Option<usize> = None;
    let mut file: Option<UploadedFile> = None;

    while let Some(field) = multipart.next_field().await.map_err(invalid_multipart)? {
        match field.name() {
            Some(NUM_QUESTIONS_FIELD) => {
                let text = field.text().await.map_err(invalid_multipart)?;
                num_questions = Some(validate_num_questions(parse_num_questions(&text)?)?);
            }
            Some(FILE_FIELD) => {
                file = Some(read_file_field(field).await?);
            }
            other => debug!("忽略未知字段: {:?}", other),
        }
    }

    let num_questions = match num_questions {
        Some(n) => n,
        None => validate_num_questions(DEFAULT_NUM_QUESTIONS)?,
    };
    let file = file.ok_or_else(|| AppError::validation("Missing file field"))?;

    let ctx = UploadCtx::new(file.name, file.kind, num_questions);
    let outcome = state
        .upload_flow
        .run(&ctx, file.bytes, state.shutdown.clone())
        .await?;

    Ok(Json(UploadResponse {
        message: "File uploaded and MCQs generated successfully",
        quiz_id: outcome.quiz_id,
        total_questions: outcome.total_questions,
    }))
}

/// GET /quiz/{id}
pub async fn get_quiz(
    State(state): State<AppState>,
    quiz_id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<QuizDetail>> {
    let Path(quiz_id) = quiz_id?;
    let detail = state.quiz_service.fetch(quiz_id).await?;
    Ok(Json(detail))
}

/// POST /quiz/{id}/submit
pub async fn submit_quiz(
    State(state): State<AppState>,
    quiz_id: Result<Path<i64>, PathRejection>,
    answers: Result<Json<HashMap<String, String>>, JsonRejection>,
) -> AppResult<Json<SubmitReport>> {
    let Path(quiz_id) = quiz_id?;
    let Json(answers) = answers?;
    let report = state.quiz_service.grade(quiz_id, &answers).await?;
    Ok(Json(report))
}

/// GET /quizzes
pub async fn recent_quizzes(
    State(state): State<AppState>,
) -> AppResult<Json<RecentQuizzesResponse>> {
    let quizzes = state.quiz_service.recent().await?;
    Ok(Json(RecentQuizzesResponse { quizzes }))
}

// ========== 辅助函数 ==========

/// 先校验 content-type，通过后才读取文件内容
async fn read_file_field(field: Field<'_>) -> AppResult<UploadedFile> {
    let content_type = field.content_type().unwrap_or_default().to_string();
    let kind = SourceKind::from_content_type(&content_type)
        .ok_or_else(|| AppError::validation("Unsupported file type"))?;

    let name = field
        .file_name()
        .and_then(base_file_name)
        .unwrap_or_else(|| format!("upload{}", kind.extension()));

    let bytes = field.bytes().await.map_err(invalid_multipart)?;

    Ok(UploadedFile {
        name,
        kind,
        bytes: bytes.to_vec(),
    })
}

/// 只保留文件名的最后一段，去掉客户端带来的目录部分
fn base_file_name(raw: &str) -> Option<String> {
    let name = raw.rsplit(|c: char| c == '/' || c == '\\').next()?.trim();
    match name {
        "" | "." | ".." => None,
        _ => Some(name.to_string()),
    }
}

fn parse_num_questions(text: &str) -> AppResult<i64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(DEFAULT_NUM_QUESTIONS);
    }
    trimmed
        .parse()
        .map_err(|_| AppError::validation("num_questions must be an integer"))
}

/// 题目数量必须在 1..=20 之间
pub fn validate_num_questions(n: i64) -> AppResult<usize> {
    if (MIN_NUM_QUESTIONS..=MAX_NUM_QUESTIONS).contains(&n) {
        Ok(n as usize)
    } else {
        Err(AppError::validation(
            "Number of questions must be between 1 and 20",
        ))
    }
}

fn invalid_multipart(err: MultipartError) -> AppError {
    AppError::validation(format!("Invalid multipart body: {}", err.body_text()))
}
