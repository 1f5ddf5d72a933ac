use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::mcq::{AnswerKey, Mcq, McqOptions};

/// quizzes 表的一行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub title: String,
    pub source_file: String,
    pub total_questions: i64,
    /// 原样保留数据库返回的时间字符串
    pub created_at: String,
}

/// 插入 quizzes 表的数据
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewQuiz {
    pub title: String,
    pub source_file: String,
    pub total_questions: i64,
    pub created_at: DateTime<Utc>,
}

impl NewQuiz {
    /// 根据原始文件名创建测验记录
    pub fn from_upload(storage_name: &str, original_name: &str, total_questions: usize) -> Self {
        Self {
            title: quiz_title(original_name),
            source_file: storage_name.to_string(),
            total_questions: total_questions as i64,
            created_at: Utc::now(),
        }
    }
}

/// questions 表的一行，选项按列平铺
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRow {
    pub id: i64,
    pub quiz_id: i64,
    pub question_number: i64,
    pub question_text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub correct_answer: AnswerKey,
    #[serde(default)]
    pub explanation: Option<String>,
}

/// 插入 questions 表的数据
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewQuestion {
    pub quiz_id: i64,
    pub question_number: i64,
    pub question_text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub correct_answer: AnswerKey,
    pub explanation: String,
}

impl NewQuestion {
    /// `question_number` 从 1 开始
    pub fn from_mcq(quiz_id: i64, question_number: usize, mcq: &Mcq) -> Self {
        Self {
            quiz_id,
            question_number: question_number as i64,
            question_text: mcq.question.clone(),
            option_a: mcq.options.a.clone(),
            option_b: mcq.options.b.clone(),
            option_c: mcq.options.c.clone(),
            option_d: mcq.options.d.clone(),
            correct_answer: mcq.correct_answer,
            explanation: mcq.explanation.clone(),
        }
    }
}

/// 返回给前端的题目，选项重新组合成对象
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: i64,
    pub question_number: i64,
    pub question_text: String,
    pub options: McqOptions,
    pub correct_answer: AnswerKey,
    pub explanation: Option<String>,
}

impl From<QuestionRow> for QuizQuestion {
    fn from(row: QuestionRow) -> Self {
        Self {
            id: row.id,
            question_number: row.question_number,
            question_text: row.question_text,
            options: McqOptions {
                a: row.option_a,
                b: row.option_b,
                c: row.option_c,
                d: row.option_d,
            },
            correct_answer: row.correct_answer,
            explanation: row.explanation,
        }
    }
}

/// GET /quiz/{id} 的返回结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizDetail {
    pub quiz: Quiz,
    pub questions: Vec<QuizQuestion>,
}

/// 单题批改结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResult {
    pub user_answer: String,
    pub correct_answer: Option<AnswerKey>,
    pub is_correct: bool,
    pub explanation: Option<String>,
}

/// 整份测验的批改结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitReport {
    pub score: usize,
    pub total_questions: usize,
    pub percentage: f64,
    pub results: BTreeMap<String, AnswerResult>,
}

/// 测验标题
pub fn quiz_title(original_name: &str) -> String {
    format!("Quiz from {}", original_name)
}

/// 存储文件名：`<YYYYmmdd_HHMMSS>_<原文件名>`
pub fn storage_file_name(original_name: &str, now: DateTime<Local>) -> String {
    format!("{}_{}", now.format("%Y%m%d_%H%M%S"), original_name)
}
