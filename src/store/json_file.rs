//! Flat JSON document store.
//!
//! The whole collection lives in one file as an array of question objects:
//! ```text
//! [
//!   {"id": 1, "type": "multiple_choice", "question": "...", "choices": [...], "level": 1, ...},
//!   ...
//! ]
//! ```
//! Mutations are applied to a copy, written to `<file>.tmp`, synced and
//! renamed over the document. The in-memory view only changes after the
//! rename succeeds, so a failed write leaves both file and view untouched.

use chrono::{NaiveDate, Utc};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::{validate_batch, QuestionStore, Result, StoreError};
use crate::domain::{BatchOrigin, Level, Question, QuestionDraft, QuestionId};

pub struct JsonFileStore {
  path: PathBuf,
  questions: Mutex<Vec<Question>>,
}

impl JsonFileStore {
  /// Open the document at `path`, starting empty if it does not exist yet
  pub fn open(path: &Path) -> Result<Self> {
    let questions = if path.exists() {
      let content = fs::read_to_string(path)?;
      if content.trim().is_empty() {
        Vec::new()
      } else {
        serde_json::from_str(&content)?
      }
    } else {
      if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
      }
      Vec::new()
    };

    Ok(Self {
      path: path.to_path_buf(),
      questions: Mutex::new(questions),
    })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  fn lock(&self) -> Result<MutexGuard<'_, Vec<Question>>> {
    self.questions.lock().map_err(|_| {
      tracing::error!("Question store mutex poisoned - a thread panicked while holding the lock");
      StoreError::Unavailable
    })
  }

  /// Persist `next` and make it the current view
  fn commit(&self, current: &mut Vec<Question>, next: Vec<Question>) -> Result<()> {
    write_document(&self.path, &next)?;
    *current = next;
    Ok(())
  }
}

fn write_document(path: &Path, questions: &[Question]) -> Result<()> {
  let tmp_path = path.with_extension("json.tmp");
  let json = serde_json::to_string_pretty(questions)?;

  let write = || -> std::io::Result<()> {
    let mut file = File::create(&tmp_path)?;
    file.write_all(json.as_bytes())?;
    file.sync_all()?;
    fs::rename(&tmp_path, path)
  };

  if let Err(e) = write() {
    let _ = fs::remove_file(&tmp_path);
    return Err(e.into());
  }
  Ok(())
}

impl QuestionStore for JsonFileStore {
  fn create_batch(
    &self,
    drafts: Vec<QuestionDraft>,
    origin: &BatchOrigin,
    today: NaiveDate,
  ) -> Result<Vec<Question>> {
    let contents = validate_batch(drafts)?;
    if contents.is_empty() {
      return Ok(Vec::new());
    }

    let mut current = self.lock()?;
    let mut next_id = current.iter().map(|q| q.id).max().unwrap_or(0) + 1;
    let created_at = Utc::now();

    let mut created = Vec::with_capacity(contents.len());
    for content in contents {
      created.push(content.into_question(next_id, origin, today, created_at));
      next_id += 1;
    }

    let mut next = current.clone();
    next.extend(created.iter().cloned());
    self.commit(&mut current, next)?;

    tracing::info!(
      "Stored {} questions from {} in {}",
      created.len(),
      origin.source_identifier,
      self.path.display()
    );
    Ok(created)
  }

  fn update_state(&self, id: QuestionId, level: Level, next_review_date: NaiveDate) -> Result<()> {
    let mut current = self.lock()?;
    let index = current
      .iter()
      .position(|q| q.id == id)
      .ok_or(StoreError::NotFound(id))?;

    let mut next = current.clone();
    next[index].level = level;
    next[index].next_review_date = next_review_date;
    self.commit(&mut current, next)?;

    tracing::debug!("Question {} -> level {}, due {}", id, level, next_review_date);
    Ok(())
  }

  fn get(&self, id: QuestionId) -> Result<Option<Question>> {
    Ok(self.lock()?.iter().find(|q| q.id == id).cloned())
  }

  fn query_due(&self, as_of: NaiveDate) -> Result<Vec<Question>> {
    Ok(self.lock()?.iter().filter(|q| q.is_due(as_of)).cloned().collect())
  }

  fn query_all(&self) -> Result<Vec<Question>> {
    Ok(self.lock()?.clone())
  }
}
