//! 测试用的内存实现：假的 AI 服务和内存数据存储

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use mcq_generator::clients::{FileState, ProviderFile};
use mcq_generator::error::{ProviderError, StoreError};
use mcq_generator::models::{AnswerKey, NewQuestion, NewQuiz, QuestionRow, Quiz};
use mcq_generator::{
    build_router, AppState, ContentProvider, McqService, QuizService, QuizStore, RouterSettings,
    UploadFlow,
};
use tokio::sync::watch;

pub const TEST_ORIGIN: &str = "http://localhost:3000";

// ========== 假的 AI 服务 ==========

#[derive(Default)]
pub struct ProviderCalls {
    pub uploads: Vec<(PathBuf, String, String)>,
    pub status_checks: usize,
    pub prompts: Vec<String>,
    pub deleted: Vec<String>,
}

pub struct FakeProvider {
    /// get_file 依次返回的状态，用完后返回 Active
    states: Mutex<VecDeque<FileState>>,
    initial_state: FileState,
    /// 固定的生成结果；为 None 时按提示词中的数量生成
    response: Mutex<Option<String>>,
    pub calls: Mutex<ProviderCalls>,
}

impl FakeProvider {
    pub fn ready() -> Self {
        Self::with_states(FileState::Active, Vec::new())
    }

    pub fn with_states(initial_state: FileState, states: Vec<FileState>) -> Self {
        Self {
            states: Mutex::new(states.into()),
            initial_state,
            response: Mutex::new(None),
            calls: Mutex::new(ProviderCalls::default()),
        }
    }

    pub fn with_response(self, response: impl Into<String>) -> Self {
        *self.response.lock().unwrap() = Some(response.into());
        self
    }

    pub fn upload_count(&self) -> usize {
        self.calls.lock().unwrap().uploads.len()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.calls.lock().unwrap().deleted.clone()
    }

    fn file(&self, state: FileState) -> ProviderFile {
        ProviderFile {
            name: "files/fake-1".to_string(),
            uri: "https://example.test/files/fake-1".to_string(),
            mime_type: "text/plain".to_string(),
            state,
        }
    }
}

#[async_trait]
impl ContentProvider for FakeProvider {
    async fn upload_file(
        &self,
        path: &Path,
        mime_type: &str,
        display_name: &str,
    ) -> Result<ProviderFile, ProviderError> {
        assert!(path.exists(), "上传时临时文件必须存在");
        self.calls.lock().unwrap().uploads.push((
            path.to_path_buf(),
            mime_type.to_string(),
            display_name.to_string(),
        ));
        Ok(self.file(self.initial_state))
    }

    async fn get_file(&self, _name: &str) -> Result<ProviderFile, ProviderError> {
        self.calls.lock().unwrap().status_checks += 1;
        let state = self
            .states
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(FileState::Active);
        Ok(self.file(state))
    }

    async fn generate(&self, _file: &ProviderFile, prompt: &str) -> Result<String, ProviderError> {
        self.calls.lock().unwrap().prompts.push(prompt.to_string());
        if let Some(response) = self.response.lock().unwrap().clone() {
            return Ok(response);
        }
        let count = requested_count(prompt);
        Ok(format!("```json\n{}\n```", mcq_json(count)))
    }

    async fn delete_file(&self, name: &str) -> Result<(), ProviderError> {
        self.calls.lock().unwrap().deleted.push(name.to_string());
        Ok(())
    }
}

/// 从提示词中取出 "exactly N" 的 N
fn requested_count(prompt: &str) -> usize {
    prompt
        .split("exactly ")
        .nth(1)
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|n| n.parse().ok())
        .unwrap_or(1)
}

/// 生成 count 道题的 JSON，正确答案依次为 A、B、C、D
pub fn mcq_json(count: usize) -> String {
    let keys = ["A", "B", "C", "D"];
    let items: Vec<String> = (0..count)
        .map(|i| {
            format!(
                r#"{{"question": "Question {n}?", "options": {{"A": "a{n}", "B": "b{n}", "C": "c{n}", "D": "d{n}"}}, "correct_answer": "{key}", "explanation": "Because {n}"}}"#,
                n = i + 1,
                key = keys[i % 4]
            )
        })
        .collect();
    format!("[{}]", items.join(",\n"))
}

// ========== 内存数据存储 ==========

#[derive(Default)]
pub struct StoreData {
    pub quizzes: Vec<Quiz>,
    pub questions: Vec<QuestionRow>,
    pub blobs: Vec<(String, usize, String)>,
    pub next_id: i64,
    pub calls: usize,
}

#[derive(Default)]
pub struct MemoryStore {
    pub data: Mutex<StoreData>,
    pub fail_blob: bool,
    pub fail_questions: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.data.lock().unwrap().calls
    }

    fn next_id(data: &mut StoreData) -> i64 {
        data.next_id += 1;
        data.next_id
    }

    /// 直接写入一个测验，返回 id
    pub fn seed_quiz(&self, title: &str, questions: &[(i64, AnswerKey)]) -> i64 {
        let mut data = self.data.lock().unwrap();
        let quiz_id = Self::next_id(&mut data);
        data.quizzes.push(Quiz {
            id: quiz_id,
            title: title.to_string(),
            source_file: format!("20250101_000000_{}.pdf", title),
            total_questions: questions.len() as i64,
            created_at: format!("2025-01-01T00:{:02}:00+00:00", quiz_id),
        });
        for (number, key) in questions {
            let id = Self::next_id(&mut data);
            data.questions.push(QuestionRow {
                id,
                quiz_id,
                question_number: *number,
                question_text: format!("Question {}", number),
                option_a: format!("a{}", number),
                option_b: format!("b{}", number),
                option_c: format!("c{}", number),
                option_d: format!("d{}", number),
                correct_answer: *key,
                explanation: Some(format!("Because {}", number)),
            });
        }
        quiz_id
    }
}

#[async_trait]
impl QuizStore for MemoryStore {
    async fn upload_blob(
        &self,
        name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError> {
        let mut data = self.data.lock().unwrap();
        data.calls += 1;
        if self.fail_blob {
            return Err(StoreError::BadStatus {
                endpoint: "storage/v1/object".to_string(),
                status: 409,
                body: "Duplicate".to_string(),
            });
        }
        data.blobs
            .push((name.to_string(), bytes.len(), content_type.to_string()));
        Ok(())
    }

    async fn insert_quiz(&self, quiz: &NewQuiz) -> Result<Quiz, StoreError> {
        let mut data = self.data.lock().unwrap();
        data.calls += 1;
        let id = Self::next_id(&mut data);
        let row = Quiz {
            id,
            title: quiz.title.clone(),
            source_file: quiz.source_file.clone(),
            total_questions: quiz.total_questions,
            created_at: quiz.created_at.to_rfc3339(),
        };
        data.quizzes.push(row.clone());
        Ok(row)
    }

    async fn insert_questions(
        &self,
        questions: &[NewQuestion],
    ) -> Result<Vec<QuestionRow>, StoreError> {
        let mut data = self.data.lock().unwrap();
        data.calls += 1;
        if self.fail_questions {
            return Err(StoreError::BadStatus {
                endpoint: "questions".to_string(),
                status: 500,
                body: "insert failed".to_string(),
            });
        }
        let mut rows = Vec::new();
        for q in questions {
            let id = Self::next_id(&mut data);
            rows.push(QuestionRow {
                id,
                quiz_id: q.quiz_id,
                question_number: q.question_number,
                question_text: q.question_text.clone(),
                option_a: q.option_a.clone(),
                option_b: q.option_b.clone(),
                option_c: q.option_c.clone(),
                option_d: q.option_d.clone(),
                correct_answer: q.correct_answer,
                explanation: Some(q.explanation.clone()),
            });
        }
        data.questions.extend(rows.iter().cloned());
        Ok(rows)
    }

    async fn delete_quiz(&self, quiz_id: i64) -> Result<(), StoreError> {
        let mut data = self.data.lock().unwrap();
        data.calls += 1;
        data.questions.retain(|q| q.quiz_id != quiz_id);
        data.quizzes.retain(|q| q.id != quiz_id);
        Ok(())
    }

    async fn get_quiz(&self, quiz_id: i64) -> Result<Option<Quiz>, StoreError> {
        let mut data = self.data.lock().unwrap();
        data.calls += 1;
        Ok(data.quizzes.iter().find(|q| q.id == quiz_id).cloned())
    }

    async fn list_questions(&self, quiz_id: i64) -> Result<Vec<QuestionRow>, StoreError> {
        let mut data = self.data.lock().unwrap();
        data.calls += 1;
        let mut rows: Vec<QuestionRow> = data
            .questions
            .iter()
            .filter(|q| q.quiz_id == quiz_id)
            .cloned()
            .collect();
        rows.sort_by_key(|q| q.question_number);
        Ok(rows)
    }

    async fn recent_quizzes(&self, limit: usize) -> Result<Vec<Quiz>, StoreError> {
        let mut data = self.data.lock().unwrap();
        data.calls += 1;
        let mut quizzes = data.quizzes.clone();
        quizzes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        quizzes.truncate(limit);
        Ok(quizzes)
    }
}

// ========== 组装 ==========

pub fn fast_mcq_service(provider: Arc<FakeProvider>) -> McqService {
    McqService::with_timing(provider, Duration::from_millis(5), Duration::from_millis(500))
}

/// 用假的外部服务构建完整路由
pub fn test_router(provider: Arc<FakeProvider>, store: Arc<MemoryStore>) -> Router {
    let quiz_service = QuizService::new(store);
    let upload_flow = UploadFlow::new(fast_mcq_service(provider), quiz_service.clone());
    // 发送端释放后等待不会被取消
    let (_, shutdown_rx) = watch::channel(false);

    let state = AppState::new(upload_flow, quiz_service, shutdown_rx);
    let settings = RouterSettings {
        cors_origin: TEST_ORIGIN.to_string(),
        max_body_bytes: 1024 * 1024,
    };
    build_router(state, &settings).expect("router should build")
}
