pub mod mcq;
pub mod quiz;
pub mod source_kind;

pub use mcq::{AnswerKey, Mcq, McqOptions};
pub use quiz::{
    quiz_title, storage_file_name, AnswerResult, NewQuestion, NewQuiz, QuestionRow, Quiz,
    QuizDetail, QuizQuestion, SubmitReport,
};
pub use source_kind::SourceKind;
