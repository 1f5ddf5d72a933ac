/// 日志工具模块
///
/// 提供日志初始化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// 初始化日志
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 debug / info
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息（不输出密钥）
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 MCQ 生成服务启动");
    info!("🌐 监听地址: {}", config.listen_addr);
    info!("🔓 允许跨域: {}", config.cors_origin);
    info!("🤖 模型: {}", config.gemini_model_name);
    info!("🪣 存储桶: {}", config.supabase_bucket);
    info!(
        "⏱️ 轮询间隔: {:?}, 最长等待: {:?}",
        config.provider_poll_interval, config.provider_max_wait
    );
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
