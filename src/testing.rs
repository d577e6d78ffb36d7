//! Test utilities for store setup.
//!
//! Provides a temporary directory with a file-backed SQLite store using the
//! authoritative schema, plus small draft builders shared by module tests.

use chrono::NaiveDate;
use std::path::Path;
use tempfile::TempDir;

use crate::domain::{BatchOrigin, QuestionDraft, QuestionType};
use crate::store::{JsonFileStore, Result, SqliteStore};

/// Test environment with a study.db in a temporary directory.
///
/// The directory (and every file created under it) is removed when dropped.
pub struct TestEnv {
  /// Temporary directory (kept alive for database file persistence)
  pub temp: TempDir,
  /// SQLite store with the full schema
  pub store: SqliteStore,
}

impl TestEnv {
  pub fn new() -> Result<Self> {
    let temp = TempDir::new()?;
    let store = SqliteStore::open(&temp.path().join("study.db"))?;
    Ok(Self { temp, store })
  }

  /// Open a JSON document store inside the same temporary directory.
  pub fn json_store(&self, name: &str) -> Result<JsonFileStore> {
    JsonFileStore::open(&self.temp.path().join(name))
  }

  /// Get the temporary directory path for creating test files.
  pub fn path(&self) -> &Path {
    self.temp.path()
  }
}

/// Fixed "today" so date arithmetic in tests is reproducible
pub fn test_date() -> NaiveDate {
  NaiveDate::from_ymd_opt(2025, 3, 14).expect("valid date")
}

pub fn origin() -> BatchOrigin {
  BatchOrigin::new("lecture-notes.pdf", "general")
}

pub fn short_draft(question: &str) -> QuestionDraft {
  QuestionDraft::new(QuestionType::ShortAnswer, question, "answer")
}

/// Multiple choice draft with `choices` generated options
pub fn mc_draft(choices: usize) -> QuestionDraft {
  let options: Vec<String> = (1..=choices).map(|i| format!("option {}", i)).collect();
  let refs: Vec<&str> = options.iter().map(String::as_str).collect();
  QuestionDraft::new(QuestionType::MultipleChoice, "Pick one", "option 1").with_choices(&refs)
}
