/// Gemini API 客户端
///
/// 封装文件上传（resumable 协议）、状态查询、内容生成和文件删除
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{ContentProvider, ProviderFile};
use crate::config::Config;
use crate::error::ProviderError;

const API_KEY_HEADER: &str = "x-goog-api-key";
const UPLOAD_URL_HEADER: &str = "x-goog-upload-url";
const UPLOAD_SESSION_ENDPOINT: &str = "upload session";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Gemini 客户端
#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    api_key: String,
    api_base_url: String,
    model_name: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: ProviderFile,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiClient {
    /// 根据配置创建客户端
    pub fn new(config: &Config) -> Self {
        Self::with_base_url(
            &config.gemini_api_key,
            &config.gemini_api_base_url,
            &config.gemini_model_name,
        )
    }

    /// 指定 API 地址创建客户端（测试时指向 mock 服务器）
    pub fn with_base_url(
        api_key: impl Into<String>,
        api_base_url: impl Into<String>,
        model_name: impl Into<String>,
    ) -> Self {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            http,
            api_key: api_key.into(),
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            model_name: model_name.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base_url, path.trim_start_matches('/'))
    }

    /// 检查状态码，非 2xx 时带上响应体返回错误
    async fn ensure_success(endpoint: &str, response: Response) -> Result<Response, ProviderError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ProviderError::BadStatus {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            body,
        })
    }

    fn request_failed(endpoint: &str) -> impl FnOnce(reqwest::Error) -> ProviderError + '_ {
        move |source| ProviderError::RequestFailed {
            endpoint: endpoint.to_string(),
            source,
        }
    }
}

#[async_trait]
impl ContentProvider for GeminiClient {
    async fn upload_file(
        &self,
        path: &Path,
        mime_type: &str,
        display_name: &str,
    ) -> Result<ProviderFile, ProviderError> {
        let bytes = tokio::fs::read(path).await?;
        let endpoint = "upload/v1beta/files";

        debug!(
            "开始上传文件到 Gemini: {} ({} 字节, {})",
            display_name,
            bytes.len(),
            mime_type
        );

        // 第一步：声明上传，拿到上传地址
        let start = self
            .http
            .post(self.url(endpoint))
            .header(API_KEY_HEADER, &self.api_key)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", bytes.len().to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&json!({ "file": { "display_name": display_name } }))
            .send()
            .await
            .map_err(Self::request_failed(endpoint))?;
        let start = Self::ensure_success(endpoint, start).await?;

        let upload_url = start
            .headers()
            .get(UPLOAD_URL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| ProviderError::BadStatus {
                endpoint: endpoint.to_string(),
                status: start.status().as_u16(),
                body: "响应中缺少上传地址".to_string(),
            })?;

        // 第二步：上传内容并结束
        let session = UPLOAD_SESSION_ENDPOINT;
        let finish = self
            .http
            .post(&upload_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(bytes)
            .send()
            .await
            .map_err(Self::request_failed(session))?;
        let finish = Self::ensure_success(session, finish).await?;

        let uploaded: UploadResponse = finish
            .json()
            .await
            .map_err(Self::request_failed(session))?;

        debug!(
            "文件上传完成: {} (状态: {:?})",
            uploaded.file.name, uploaded.file.state
        );

        Ok(uploaded.file)
    }

    async fn get_file(&self, name: &str) -> Result<ProviderFile, ProviderError> {
        let endpoint = format!("v1beta/{}", name);
        let response = self
            .http
            .get(self.url(&endpoint))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(Self::request_failed(&endpoint))?;
        let response = Self::ensure_success(&endpoint, response).await?;

        response
            .json()
            .await
            .map_err(Self::request_failed(&endpoint))
    }

    async fn generate(&self, file: &ProviderFile, prompt: &str) -> Result<String, ProviderError> {
        let endpoint = format!("v1beta/models/{}:generateContent", self.model_name);

        debug!("调用 Gemini 生成内容，模型: {}", self.model_name);

        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [
                    { "file_data": { "mime_type": file.mime_type, "file_uri": file.uri } },
                    { "text": prompt }
                ]
            }]
        });

        let response = self
            .http
            .post(self.url(&endpoint))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(Self::request_failed(&endpoint))?;
        let response = Self::ensure_success(&endpoint, response).await?;

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(Self::request_failed(&endpoint))?;

        let text = generated
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| ProviderError::EmptyResponse {
                model: self.model_name.clone(),
            })?;

        debug!("Gemini 生成成功，返回 {} 字符", text.len());

        Ok(text)
    }

    async fn delete_file(&self, name: &str) -> Result<(), ProviderError> {
        let endpoint = format!("v1beta/{}", name);
        let response = self
            .http
            .delete(self.url(&endpoint))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(Self::request_failed(&endpoint))?;
        Self::ensure_success(&endpoint, response).await?;

        debug!("已删除 Gemini 文件: {}", name);
        Ok(())
    }
}
