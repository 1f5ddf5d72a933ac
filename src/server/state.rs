use tokio::sync::watch;

use crate::services::QuizService;
use crate::workflow::UploadFlow;

/// 路由共享状态
///
/// 只包含无状态的服务句柄，克隆开销很小
#[derive(Clone)]
pub struct AppState {
    pub upload_flow: UploadFlow,
    pub quiz_service: QuizService,
    /// 关闭信号，传给正在等待 AI 服务的请求
    pub shutdown: watch::Receiver<bool>,
}

impl AppState {
    pub fn new(
        upload_flow: UploadFlow,
        quiz_service: QuizService,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            upload_flow,
            quiz_service,
            shutdown,
        }
    }
}
