//! Durable question storage.
//!
//! The scheduler only ever talks to [`QuestionStore`]; any backend that can
//! create batches, overwrite review state and answer due-date queries fits:
//! - [`SqliteStore`] - embedded SQLite database (default)
//! - [`JsonFileStore`] - a single JSON document, rewritten atomically

pub mod json_file;
pub mod sqlite;

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{StoreBackend, StoreConfig};
use crate::db::DbLockError;
use crate::domain::{
  BatchOrigin, Level, Question, QuestionContent, QuestionDraft, QuestionId, ValidationError,
};

pub use json_file::JsonFileStore;
pub use sqlite::SqliteStore;

#[derive(Error, Debug)]
pub enum StoreError {
  #[error("invalid draft at position {index}: {source}")]
  Validation {
    index: usize,
    #[source]
    source: ValidationError,
  },

  #[error("question not found: {0}")]
  NotFound(QuestionId),

  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),

  #[error("database error: {0}")]
  Database(#[from] rusqlite::Error),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("store unavailable")]
  Unavailable,
}

impl StoreError {
  /// True for failures of the underlying medium (disk, database, encoding)
  pub fn is_io(&self) -> bool {
    matches!(
      self,
      Self::Io(_) | Self::Database(_) | Self::Serialization(_) | Self::Unavailable
    )
  }
}

impl From<DbLockError> for StoreError {
  fn from(_: DbLockError) -> Self {
    Self::Unavailable
  }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Question count per level. Every level 1..=5 is present.
pub type LevelHistogram = BTreeMap<Level, usize>;

pub trait QuestionStore: Send + Sync {
  /// Validate and persist a batch, all or nothing.
  ///
  /// Ids continue from the highest existing id, in draft order. Every new
  /// question is at level 1 and due `today`.
  fn create_batch(
    &self,
    drafts: Vec<QuestionDraft>,
    origin: &BatchOrigin,
    today: NaiveDate,
  ) -> Result<Vec<Question>>;

  /// Overwrite the review state of one question and nothing else
  fn update_state(&self, id: QuestionId, level: Level, next_review_date: NaiveDate) -> Result<()>;

  fn get(&self, id: QuestionId) -> Result<Option<Question>>;

  /// Every question with `next_review_date <= as_of`
  fn query_due(&self, as_of: NaiveDate) -> Result<Vec<Question>>;

  fn query_all(&self) -> Result<Vec<Question>>;

  fn count_due(&self, as_of: NaiveDate) -> Result<usize> {
    Ok(self.query_due(as_of)?.len())
  }

  fn level_histogram(&self) -> Result<LevelHistogram> {
    Ok(histogram_of(&self.query_all()?))
  }
}

/// Validate every draft before anything is written
pub fn validate_batch(drafts: Vec<QuestionDraft>) -> Result<Vec<QuestionContent>> {
  drafts
    .into_iter()
    .enumerate()
    .map(|(index, draft)| {
      draft
        .validate()
        .map_err(|source| StoreError::Validation { index, source })
    })
    .collect()
}

pub fn empty_histogram() -> LevelHistogram {
  Level::all().map(|level| (level, 0)).collect()
}

pub fn histogram_of(questions: &[Question]) -> LevelHistogram {
  let mut histogram = empty_histogram();
  for question in questions {
    *histogram.entry(question.level).or_insert(0) += 1;
  }
  histogram
}

/// Open the configured backend
pub fn open_store(config: &StoreConfig) -> Result<Arc<dyn QuestionStore>> {
  match config.backend {
    StoreBackend::Sqlite => {
      tracing::info!("Opening SQLite question store at {}", config.path.display());
      Ok(Arc::new(SqliteStore::open(&config.path)?))
    }
    StoreBackend::Json => {
      tracing::info!("Opening JSON question store at {}", config.path.display());
      Ok(Arc::new(JsonFileStore::open(&config.path)?))
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::QuestionType;

  #[test]
  fn test_validate_batch_reports_position() {
    let drafts = vec![
      QuestionDraft::new(QuestionType::ShortAnswer, "Q1", "A1"),
      QuestionDraft::new(QuestionType::MultipleChoice, "Q2", "A2").with_choices(&["a", "b", "c"]),
    ];
    match validate_batch(drafts) {
      Err(StoreError::Validation { index, source }) => {
        assert_eq!(index, 1);
        assert!(matches!(source, ValidationError::ChoiceCount { found: 3, .. }));
      }
      other => panic!("expected validation error, got {:?}", other),
    }
  }

  #[test]
  fn test_empty_histogram_has_all_levels() {
    let histogram = empty_histogram();
    assert_eq!(histogram.len(), 5);
    assert!(histogram.values().all(|&count| count == 0));
  }

  #[test]
  fn test_error_classification() {
    assert!(StoreError::Unavailable.is_io());
    assert!(StoreError::Io(std::io::Error::other("disk full")).is_io());
    assert!(!StoreError::NotFound(3).is_io());
  }
}
