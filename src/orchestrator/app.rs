//! 应用生命周期
//!
//! 1. **初始化**：创建 Gemini / Supabase 客户端，组装服务和路由
//! 2. **运行**：监听端口，处理请求
//! 3. **关闭**：收到 Ctrl-C 后通知所有正在等待 AI 服务的请求，然后退出

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::clients::{GeminiClient, SupabaseClient};
use crate::config::Config;
use crate::server::{build_router, AppState, RouterSettings};
use crate::services::{McqService, QuizService};
use crate::utils::logging::log_startup;
use crate::workflow::UploadFlow;

/// 应用主结构
pub struct App {
    config: Config,
    router: Router,
    shutdown_tx: watch::Sender<bool>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        let gemini = Arc::new(GeminiClient::new(&config));
        let supabase = Arc::new(SupabaseClient::new(&config));

        let mcq_service = McqService::new(gemini, &config);
        let quiz_service = QuizService::new(supabase);
        let upload_flow = UploadFlow::new(mcq_service, quiz_service.clone());

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let state = AppState::new(upload_flow, quiz_service, shutdown_rx);

        let settings = RouterSettings {
            cors_origin: config.cors_origin.clone(),
            max_body_bytes: config.max_upload_bytes,
        };
        let router = build_router(state, &settings).context("构建路由失败")?;

        Ok(Self {
            config,
            router,
            shutdown_tx,
        })
    }

    /// 运行 HTTP 服务，直到收到 Ctrl-C
    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(&self.config.listen_addr)
            .await
            .with_context(|| format!("无法监听地址: {}", self.config.listen_addr))?;

        info!("✓ 服务已启动: http://{}", listener.local_addr()?);

        let shutdown_tx = self.shutdown_tx;
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                wait_for_ctrl_c().await;
                info!("🛑 收到关闭信号，停止等待中的请求...");
                let _ = shutdown_tx.send(true);
            })
            .await
            .context("HTTP 服务异常退出")?;

        info!("👋 服务已关闭");
        Ok(())
    }
}

async fn wait_for_ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("⚠️ 无法监听 Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
