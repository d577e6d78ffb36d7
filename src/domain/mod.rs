pub mod question;

pub use question::{
  BatchOrigin, InvalidLevel, Level, Question, QuestionContent, QuestionDraft, QuestionId, QuestionKind,
  QuestionType, ValidationError, CHOICE_COUNT,
};
