pub mod mcq_service;
pub mod quiz_service;

pub use mcq_service::McqService;
pub use quiz_service::{QuizService, RECENT_QUIZ_LIMIT};
