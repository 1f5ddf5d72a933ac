//! 测验服务 - 业务能力层
//!
//! 负责测验的存储、读取和批改

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::clients::QuizStore;
use crate::error::{AppError, AppResult, StoreError};
use crate::models::{
    AnswerKey, AnswerResult, Mcq, NewQuestion, NewQuiz, QuestionRow, Quiz, QuizDetail,
    QuizQuestion, SubmitReport,
};

/// 最近测验列表的长度
pub const RECENT_QUIZ_LIMIT: usize = 10;

/// 测验服务
#[derive(Clone)]
pub struct QuizService {
    store: Arc<dyn QuizStore>,
}

impl QuizService {
    /// 创建新的测验服务
    pub fn new(store: Arc<dyn QuizStore>) -> Self {
        Self { store }
    }

    /// 上传原始文件到存储桶
    pub async fn upload_source(
        &self,
        storage_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError> {
        self.store
            .upload_blob(storage_name, bytes, content_type)
            .await
    }

    /// 保存测验和题目，返回测验 ID
    ///
    /// 题目一次性批量插入；插入失败时删除刚创建的测验，
    /// 保证测验的 total_questions 和题目数量一致
    pub async fn persist(
        &self,
        mcqs: &[Mcq],
        storage_name: &str,
        original_name: &str,
    ) -> Result<i64, StoreError> {
        let new_quiz = NewQuiz::from_upload(storage_name, original_name, mcqs.len());
        let quiz = self.store.insert_quiz(&new_quiz).await?;
        debug!("已创建测验 #{} ({})", quiz.id, quiz.title);

        let questions: Vec<NewQuestion> = mcqs
            .iter()
            .enumerate()
            .map(|(i, mcq)| NewQuestion::from_mcq(quiz.id, i + 1, mcq))
            .collect();

        if let Err(e) = self.store.insert_questions(&questions).await {
            warn!("⚠️ 题目写入失败，回滚测验 #{}: {}", quiz.id, e);
            if let Err(cleanup) = self.store.delete_quiz(quiz.id).await {
                error!("❌ 回滚测验 #{} 失败: {}", quiz.id, cleanup);
            }
            return Err(e);
        }

        info!("✓ 测验 #{} 已保存，共 {} 道题", quiz.id, questions.len());
        Ok(quiz.id)
    }

    /// 读取测验和全部题目
    pub async fn fetch(&self, quiz_id: i64) -> AppResult<QuizDetail> {
        let quiz = self
            .store
            .get_quiz(quiz_id)
            .await?
            .ok_or_else(|| AppError::not_found("Quiz not found"))?;

        let mut rows = self.store.list_questions(quiz_id).await?;
        rows.sort_by_key(|row| row.question_number);

        Ok(QuizDetail {
            quiz,
            questions: rows.into_iter().map(QuizQuestion::from).collect(),
        })
    }

    /// 批改答案
    pub async fn grade(
        &self,
        quiz_id: i64,
        answers: &HashMap<String, String>,
    ) -> AppResult<SubmitReport> {
        let rows = self.store.list_questions(quiz_id).await?;

        if rows.is_empty() {
            // 区分"测验不存在"和"测验没有题目"
            if self.store.get_quiz(quiz_id).await?.is_none() {
                return Err(AppError::not_found("Quiz not found"));
            }
        }

        let report = grade_answers(&rows, answers)?;
        info!(
            "📊 测验 #{} 批改完成: {}/{} ({:.2}%)",
            quiz_id, report.score, report.total_questions, report.percentage
        );
        Ok(report)
    }

    /// 最近创建的测验，最多 10 个
    pub async fn recent(&self) -> AppResult<Vec<Quiz>> {
        let mut quizzes = self.store.recent_quizzes(RECENT_QUIZ_LIMIT).await?;
        quizzes.truncate(RECENT_QUIZ_LIMIT);
        Ok(quizzes)
    }
}

/// 根据题目计算得分
///
/// 没有题目时返回参数错误，不做除零
pub fn grade_answers(
    rows: &[QuestionRow],
    answers: &HashMap<String, String>,
) -> AppResult<SubmitReport> {
    if rows.is_empty() {
        return Err(AppError::validation("Quiz has no questions to grade"));
    }

    let answer_key: HashMap<String, (AnswerKey, Option<&String>)> = rows
        .iter()
        .map(|row| {
            (
                row.id.to_string(),
                (row.correct_answer, row.explanation.as_ref()),
            )
        })
        .collect();

    let mut score = 0;
    let mut results = BTreeMap::new();

    for (question_id, user_answer) in answers {
        let expected = answer_key.get(question_id);
        let is_correct = match expected {
            Some((correct, _)) => user_answer.as_str() == correct.as_str(),
            None => false,
        };
        if is_correct {
            score += 1;
        }

        results.insert(
            question_id.clone(),
            AnswerResult {
                user_answer: user_answer.clone(),
                correct_answer: expected.map(|(correct, _)| *correct),
                is_correct,
                explanation: expected.and_then(|(_, explanation)| explanation.cloned()),
            },
        );
    }

    let total_questions = rows.len();
    Ok(SubmitReport {
        score,
        total_questions,
        percentage: round_percentage(score, total_questions),
        results,
    })
}

/// 百分比，保留两位小数
fn round_percentage(score: usize, total: usize) -> f64 {
    let raw = score as f64 / total as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}
