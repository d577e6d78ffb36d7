use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

pub type QuestionId = i64;

/// Number of choices every multiple choice question carries
pub const CHOICE_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
  MultipleChoice,
  ShortAnswer,
  Subjective,
}

impl QuestionType {
  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "multiple_choice" => Some(Self::MultipleChoice),
      "short_answer" => Some(Self::ShortAnswer),
      "subjective" => Some(Self::Subjective),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::MultipleChoice => "multiple_choice",
      Self::ShortAnswer => "short_answer",
      Self::Subjective => "subjective",
    }
  }
}

/// Type-specific part of a question. Choices only exist on the
/// multiple choice variant and always number exactly [`CHOICE_COUNT`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionKind {
  MultipleChoice { choices: [String; CHOICE_COUNT] },
  ShortAnswer,
  Subjective,
}

impl QuestionKind {
  pub fn question_type(&self) -> QuestionType {
    match self {
      Self::MultipleChoice { .. } => QuestionType::MultipleChoice,
      Self::ShortAnswer => QuestionType::ShortAnswer,
      Self::Subjective => QuestionType::Subjective,
    }
  }

  pub fn choices(&self) -> &[String] {
    match self {
      Self::MultipleChoice { choices } => choices,
      _ => &[],
    }
  }
}

/// Mastery level, always within 1..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Level(u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("level {0} is outside 1..=5")]
pub struct InvalidLevel(pub i64);

impl Level {
  pub const MIN: Level = Level(1);
  pub const MAX: Level = Level(5);

  pub fn new(value: u8) -> Option<Self> {
    Self::from_raw(value as i64).ok()
  }

  /// Parse a stored level, rejecting anything outside 1..=5
  pub fn from_raw(value: i64) -> Result<Self, InvalidLevel> {
    if (Self::MIN.0 as i64..=Self::MAX.0 as i64).contains(&value) {
      Ok(Self(value as u8))
    } else {
      Err(InvalidLevel(value))
    }
  }

  pub fn get(self) -> u8 {
    self.0
  }

  /// One level up, capped at [`Level::MAX`]
  pub fn promoted(self) -> Self {
    Self((self.0 + 1).min(Self::MAX.0))
  }

  pub fn all() -> impl Iterator<Item = Level> {
    (Self::MIN.0..=Self::MAX.0).map(Level)
  }
}

impl Default for Level {
  fn default() -> Self {
    Self::MIN
  }
}

impl TryFrom<u8> for Level {
  type Error = InvalidLevel;

  fn try_from(value: u8) -> Result<Self, Self::Error> {
    Self::from_raw(value as i64)
  }
}

impl From<Level> for u8 {
  fn from(level: Level) -> Self {
    level.0
  }
}

impl fmt::Display for Level {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Where a batch of questions came from. Shared by every question in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOrigin {
  pub source_identifier: String,
  pub category: String,
}

impl BatchOrigin {
  pub fn new(source_identifier: impl Into<String>, category: impl Into<String>) -> Self {
    Self {
      source_identifier: source_identifier.into(),
      category: category.into(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
  pub id: QuestionId,
  #[serde(flatten)]
  pub kind: QuestionKind,
  pub question: String,
  pub answer: String,
  #[serde(default)]
  pub explanation: String,
  #[serde(default)]
  pub related_image_reference: Option<String>,
  pub category: String,
  pub source_identifier: String,
  pub level: Level,
  pub next_review_date: NaiveDate,
  pub created_at: DateTime<Utc>,
}

impl Question {
  pub fn question_type(&self) -> QuestionType {
    self.kind.question_type()
  }

  pub fn is_due(&self, as_of: NaiveDate) -> bool {
    self.next_review_date <= as_of
  }
}

/// Draft validation failures. A failing draft is never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("missing required field `{0}`")]
  MissingField(&'static str),

  #[error("multiple choice question needs exactly {expected} choices, got {found}")]
  ChoiceCount { expected: usize, found: usize },
}

/// Question content as handed over by the generator, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDraft {
  #[serde(rename = "type", default)]
  pub question_type: Option<QuestionType>,
  #[serde(default)]
  pub question: Option<String>,
  #[serde(default)]
  pub answer: Option<String>,
  #[serde(default)]
  pub explanation: Option<String>,
  #[serde(default, deserialize_with = "null_as_empty")]
  pub choices: Vec<String>,
  #[serde(default)]
  pub related_image_reference: Option<String>,
}

/// Generators emit `"choices": null` for questions without options
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl QuestionDraft {
  pub fn new(question_type: QuestionType, question: &str, answer: &str) -> Self {
    Self {
      question_type: Some(question_type),
      question: Some(question.to_string()),
      answer: Some(answer.to_string()),
      ..Self::default()
    }
  }

  pub fn with_choices(mut self, choices: &[&str]) -> Self {
    self.choices = choices.iter().map(|c| c.to_string()).collect();
    self
  }

  pub fn with_explanation(mut self, explanation: &str) -> Self {
    self.explanation = Some(explanation.to_string());
    self
  }

  pub fn with_image(mut self, reference: &str) -> Self {
    self.related_image_reference = Some(reference.to_string());
    self
  }

  /// Check the draft and turn it into typed content.
  ///
  /// Choices supplied for a non multiple choice draft are dropped.
  pub fn validate(self) -> Result<QuestionContent, ValidationError> {
    let question_type = self
      .question_type
      .ok_or(ValidationError::MissingField("type"))?;
    let question = required(self.question, "question")?;
    let answer = required(self.answer, "answer")?;

    let kind = match question_type {
      QuestionType::MultipleChoice => {
        let found = self.choices.len();
        let choices = <[String; CHOICE_COUNT]>::try_from(self.choices).map_err(|_| {
          ValidationError::ChoiceCount {
            expected: CHOICE_COUNT,
            found,
          }
        })?;
        QuestionKind::MultipleChoice { choices }
      }
      QuestionType::ShortAnswer => QuestionKind::ShortAnswer,
      QuestionType::Subjective => QuestionKind::Subjective,
    };

    Ok(QuestionContent {
      kind,
      question,
      answer,
      explanation: self.explanation.unwrap_or_default(),
      related_image_reference: self.related_image_reference.filter(|r| !r.trim().is_empty()),
    })
  }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
  match value {
    Some(v) if !v.trim().is_empty() => Ok(v),
    _ => Err(ValidationError::MissingField(field)),
  }
}

/// Validated question content, ready to receive an id and review state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionContent {
  pub kind: QuestionKind,
  pub question: String,
  pub answer: String,
  pub explanation: String,
  pub related_image_reference: Option<String>,
}

impl QuestionContent {
  /// New questions start at level 1, due on the day they are created
  pub fn into_question(
    self,
    id: QuestionId,
    origin: &BatchOrigin,
    today: NaiveDate,
    created_at: DateTime<Utc>,
  ) -> Question {
    Question {
      id,
      kind: self.kind,
      question: self.question,
      answer: self.answer,
      explanation: self.explanation,
      related_image_reference: self.related_image_reference,
      category: origin.category.clone(),
      source_identifier: origin.source_identifier.clone(),
      level: Level::MIN,
      next_review_date: today,
      created_at,
    }
  }
}
