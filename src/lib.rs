//! # MCQ Generator
//!
//! 上传文档或图片，由 AI 生成选择题，保存为测验并提供批改接口
//!
//! ## 架构设计
//!
//! ### ① 外部服务层（Clients）
//! - `clients/` - 只描述外部服务的能力，不关心业务
//! - `GeminiClient` - 文件上传、状态查询、内容生成
//! - `SupabaseClient` - 文件桶和 quizzes / questions 表
//!
//! ### ② 业务能力层（Services）
//! - `McqService` - 把一个文件变成 N 道选择题
//! - `QuizService` - 测验的保存、读取、批改
//!
//! ### ③ 流程层（Workflow）
//! - `UploadCtx` - 上下文封装（存储文件名 + 题目数量）
//! - `UploadFlow` - 流程编排（存储 → 生成 → 保存）
//!
//! ### ④ 路由层（Server）
//! - `server/` - 参数校验、错误分类、JSON 输出
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator::App` - 组装依赖、启动服务、优雅关闭
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod server;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{ContentProvider, GeminiClient, QuizStore, SupabaseClient};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use orchestrator::App;
pub use server::{build_router, AppState, RouterSettings};
pub use services::{McqService, QuizService};
pub use workflow::{UploadCtx, UploadFlow, UploadOutcome};
