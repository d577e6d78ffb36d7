//! Hand-off point for generated questions.
//!
//! Items that fail to parse or validate are dropped and reported one by one;
//! the rest are committed as a single batch.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{BatchOrigin, Question, QuestionDraft};
use crate::store::{QuestionStore, Result};

/// A draft that was left out of the batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
  /// Position of the draft in the submitted list
  pub index: usize,
  pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
  pub created: Vec<Question>,
  pub rejected: Vec<Rejection>,
}

pub fn ingest_drafts(
  store: &dyn QuestionStore,
  drafts: Vec<QuestionDraft>,
  origin: &BatchOrigin,
  today: NaiveDate,
) -> Result<IngestReport> {
  ingest(store, drafts.into_iter().map(Ok).collect(), origin, today)
}

/// Ingest raw generator output. An item that does not even parse as a
/// draft is rejected on its own; it never sinks the rest of the batch.
pub fn ingest_json(
  store: &dyn QuestionStore,
  items: Vec<serde_json::Value>,
  origin: &BatchOrigin,
  today: NaiveDate,
) -> Result<IngestReport> {
  let parsed = items
    .into_iter()
    .map(|item| serde_json::from_value::<QuestionDraft>(item).map_err(|e| e.to_string()))
    .collect();
  ingest(store, parsed, origin, today)
}

fn ingest(
  store: &dyn QuestionStore,
  drafts: Vec<std::result::Result<QuestionDraft, String>>,
  origin: &BatchOrigin,
  today: NaiveDate,
) -> Result<IngestReport> {
  let mut valid = Vec::with_capacity(drafts.len());
  let mut rejected = Vec::new();

  for (index, draft) in drafts.into_iter().enumerate() {
    let checked = draft.and_then(|draft| match draft.clone().validate() {
      Ok(_) => Ok(draft),
      Err(e) => Err(e.to_string()),
    });

    match checked {
      Ok(draft) => valid.push(draft),
      Err(reason) => {
        tracing::warn!("Dropping draft {} from {}: {}", index, origin.source_identifier, reason);
        rejected.push(Rejection { index, reason });
      }
    }
  }

  let created = store.create_batch(valid, origin, today)?;
  Ok(IngestReport { created, rejected })
}
