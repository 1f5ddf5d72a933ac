/// Supabase 客户端
///
/// 表操作走 PostgREST（`/rest/v1`），文件走 Storage（`/storage/v1/object`）
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::QuizStore;
use crate::config::Config;
use crate::error::StoreError;
use crate::models::{NewQuestion, NewQuiz, QuestionRow, Quiz};

const QUIZZES_TABLE: &str = "quizzes";
const QUESTIONS_TABLE: &str = "questions";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Supabase 客户端
#[derive(Clone)]
pub struct SupabaseClient {
    http: Client,
    base_url: String,
    api_key: String,
    bucket: String,
}

impl SupabaseClient {
    /// 根据配置创建客户端
    pub fn new(config: &Config) -> Self {
        Self::with_base_url(
            &config.supabase_url,
            &config.supabase_key,
            &config.supabase_bucket,
        )
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            bucket: bucket.into(),
        }
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// 加上鉴权头
    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// 存储对象地址，每一段单独做百分号编码
    fn storage_object_url(&self, name: &str) -> Result<Url, StoreError> {
        let invalid = || StoreError::InvalidUrl {
            url: self.base_url.clone(),
        };
        let mut url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(["storage", "v1", "object", self.bucket.as_str(), name]);
        Ok(url)
    }

    async fn send(&self, endpoint: &str, builder: RequestBuilder) -> Result<Response, StoreError> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(|source| StoreError::RequestFailed {
                endpoint: endpoint.to_string(),
                source,
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(StoreError::BadStatus {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            body,
        })
    }

    async fn rows<T: DeserializeOwned>(table: &str, response: Response) -> Result<Vec<T>, StoreError> {
        response
            .json::<Vec<T>>()
            .await
            .map_err(|source| StoreError::UnexpectedRow {
                table: table.to_string(),
                source,
            })
    }

    async fn delete_where(&self, table: &str, column: &str, value: i64) -> Result<(), StoreError> {
        let builder = self
            .http
            .delete(self.rest_url(table))
            .query(&[(column, format!("eq.{}", value))]);
        self.send(table, builder).await?;
        Ok(())
    }
}

#[async_trait]
impl QuizStore for SupabaseClient {
    async fn upload_blob(
        &self,
        name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError> {
        let endpoint = format!("storage/v1/object/{}/{}", self.bucket, name);
        debug!("上传文件到存储桶: {} ({} 字节)", endpoint, bytes.len());

        let url = self.storage_object_url(name)?;
        let builder = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes);
        self.send(&endpoint, builder).await?;
        Ok(())
    }

    async fn insert_quiz(&self, quiz: &NewQuiz) -> Result<Quiz, StoreError> {
        let builder = self
            .http
            .post(self.rest_url(QUIZZES_TABLE))
            .header("Prefer", "return=representation")
            .json(quiz);
        let response = self.send(QUIZZES_TABLE, builder).await?;

        Self::rows::<Quiz>(QUIZZES_TABLE, response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::EmptyInsert {
                table: QUIZZES_TABLE.to_string(),
            })
    }

    async fn insert_questions(
        &self,
        questions: &[NewQuestion],
    ) -> Result<Vec<QuestionRow>, StoreError> {
        // PostgREST 对数组请求体使用单条 INSERT 语句
        let builder = self
            .http
            .post(self.rest_url(QUESTIONS_TABLE))
            .header("Prefer", "return=representation")
            .json(questions);
        let response = self.send(QUESTIONS_TABLE, builder).await?;

        let rows = Self::rows::<QuestionRow>(QUESTIONS_TABLE, response).await?;
        if rows.len() != questions.len() {
            return Err(StoreError::EmptyInsert {
                table: QUESTIONS_TABLE.to_string(),
            });
        }
        Ok(rows)
    }

    async fn delete_quiz(&self, quiz_id: i64) -> Result<(), StoreError> {
        self.delete_where(QUESTIONS_TABLE, "quiz_id", quiz_id).await?;
        self.delete_where(QUIZZES_TABLE, "id", quiz_id).await
    }

    async fn get_quiz(&self, quiz_id: i64) -> Result<Option<Quiz>, StoreError> {
        let builder = self
            .http
            .get(self.rest_url(QUIZZES_TABLE))
            .query(&[("select", "*".to_string()), ("id", format!("eq.{}", quiz_id))]);
        let response = self.send(QUIZZES_TABLE, builder).await?;

        Ok(Self::rows::<Quiz>(QUIZZES_TABLE, response)
            .await?
            .into_iter()
            .next())
    }

    async fn list_questions(&self, quiz_id: i64) -> Result<Vec<QuestionRow>, StoreError> {
        let builder = self.http.get(self.rest_url(QUESTIONS_TABLE)).query(&[
            ("select", "*".to_string()),
            ("quiz_id", format!("eq.{}", quiz_id)),
            ("order", "question_number.asc".to_string()),
        ]);
        let response = self.send(QUESTIONS_TABLE, builder).await?;

        Self::rows(QUESTIONS_TABLE, response).await
    }

    async fn recent_quizzes(&self, limit: usize) -> Result<Vec<Quiz>, StoreError> {
        let builder = self.http.get(self.rest_url(QUIZZES_TABLE)).query(&[
            ("select", "*".to_string()),
            ("order", "created_at.desc".to_string()),
            ("limit", limit.to_string()),
        ]);
        let response = self.send(QUIZZES_TABLE, builder).await?;

        Self::rows(QUIZZES_TABLE, response).await
    }
}
