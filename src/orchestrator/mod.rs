//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 管理服务的生命周期：创建客户端和服务、启动 HTTP 服务、优雅关闭。
//!
//! ## 层次关系
//!
//! ```text
//! orchestrator::App (生命周期)
//!     ↓
//! server (路由层：参数校验、错误映射)
//!     ↓
//! workflow::UploadFlow (一次上传的完整流程)
//!     ↓
//! services (能力层：生成 / 存储 / 批改)
//!     ↓
//! clients (外部服务：Gemini / Supabase)
//! ```

pub mod app;

pub use app::App;
