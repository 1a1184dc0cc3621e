//! Question bank and auto-generated exam papers.

pub mod error;
pub mod generator;
pub mod question;

pub use error::ExamError;
pub use generator::{ExamBlueprint, ExamItem, GeneratedExam, generate_exam};
pub use question::{Difficulty, MAX_MARKS, Question, QuestionKind};
