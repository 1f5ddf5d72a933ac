//! HTTP 路由层
//!
//! | 路由 | 说明 |
//! |---|---|
//! | `GET /` | 存活检查 |
//! | `POST /upload` | 上传文件并生成测验 |
//! | `GET /quiz/{id}` | 获取测验和题目 |
//! | `POST /quiz/{id}/submit` | 提交答案并批改 |
//! | `GET /quizzes` | 最近 10 个测验 |

pub mod routes;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::ConfigError;

pub use state::AppState;

/// 路由配置
#[derive(Debug, Clone)]
pub struct RouterSettings {
    /// 允许跨域的唯一来源
    pub cors_origin: String,
    /// 请求体大小上限（字节）
    pub max_body_bytes: usize,
}

/// 构建完整的路由
pub fn build_router(state: AppState, settings: &RouterSettings) -> Result<Router, ConfigError> {
    let cors = cors_layer(&settings.cors_origin)?;

    Ok(Router::new()
        .route("/", get(routes::root))
        .route("/upload", post(routes::upload))
        .route("/quiz/{id}", get(routes::get_quiz))
        .route("/quiz/{id}/submit", post(routes::submit_quiz))
        .route("/quizzes", get(routes::recent_quizzes))
        .layer(DefaultBodyLimit::max(settings.max_body_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// 只允许配置的来源；携带凭证时方法和请求头按请求回显
fn cors_layer(origin: &str) -> Result<CorsLayer, ConfigError> {
    let origin = HeaderValue::from_str(origin).map_err(|_| ConfigError::EnvVarParseFailed {
        var_name: "CORS_ORIGIN".to_string(),
        value: origin.to_string(),
        expected_type: "HTTP origin".to_string(),
    })?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list([origin]))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}
