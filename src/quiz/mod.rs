pub mod bank;
pub mod engine;

pub use bank::{ChoiceKey, QuestionBank};
pub use engine::{QuizState, DEFAULT_QUIZ_LENGTH};
