use chrono::{NaiveDate, Utc};
use std::path::Path;

use super::{empty_histogram, validate_batch, LevelHistogram, QuestionStore, Result, StoreError};
use crate::db::{self, try_lock, DbPool};
use crate::domain::{BatchOrigin, Level, Question, QuestionDraft, QuestionId};

/// Question store backed by a single SQLite connection
#[derive(Clone)]
pub struct SqliteStore {
  pool: DbPool,
}

impl SqliteStore {
  pub fn open(path: &Path) -> Result<Self> {
    Ok(Self {
      pool: db::init_db(path)?,
    })
  }

  pub fn in_memory() -> Result<Self> {
    Ok(Self {
      pool: db::init_memory_db()?,
    })
  }

  pub fn pool(&self) -> &DbPool {
    &self.pool
  }
}

impl QuestionStore for SqliteStore {
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

    let mut conn = try_lock(&self.pool)?;
    let tx = conn.transaction()?;

    let mut next_id = db::max_question_id(&tx)? + 1;
    let created_at = Utc::now();
    let mut created = Vec::with_capacity(contents.len());

    for content in contents {
      let question = content.into_question(next_id, origin, today, created_at);
      db::insert_question(&tx, &question)?;
      created.push(question);
      next_id += 1;
    }

    // Dropping an uncommitted transaction rolls back every insert above
    tx.commit()?;

    tracing::info!(
      "Stored {} questions from {} (ids {}..={})",
      created.len(),
      origin.source_identifier,
      created[0].id,
      next_id - 1
    );
    Ok(created)
  }

  fn update_state(&self, id: QuestionId, level: Level, next_review_date: NaiveDate) -> Result<()> {
    let conn = try_lock(&self.pool)?;
    let changed = db::update_question_state(&conn, id, level, next_review_date)?;
    if changed == 0 {
      return Err(StoreError::NotFound(id));
    }
    tracing::debug!("Question {} -> level {}, due {}", id, level, next_review_date);
    Ok(())
  }

  fn get(&self, id: QuestionId) -> Result<Option<Question>> {
    let conn = try_lock(&self.pool)?;
    Ok(db::get_question_by_id(&conn, id)?)
  }

  fn query_due(&self, as_of: NaiveDate) -> Result<Vec<Question>> {
    let conn = try_lock(&self.pool)?;
    Ok(db::get_due_questions(&conn, as_of)?)
  }

  fn query_all(&self) -> Result<Vec<Question>> {
    let conn = try_lock(&self.pool)?;
    Ok(db::get_all_questions(&conn)?)
  }

  fn count_due(&self, as_of: NaiveDate) -> Result<usize> {
    let conn = try_lock(&self.pool)?;
    Ok(db::count_due_questions(&conn, as_of)? as usize)
  }

  fn level_histogram(&self) -> Result<LevelHistogram> {
    let conn = try_lock(&self.pool)?;
    let mut histogram = empty_histogram();
    for (level, count) in db::get_level_counts(&conn)? {
      histogram.insert(level, count);
    }
    Ok(histogram)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{QuestionKind, ValidationError};
  use crate::testing::{mc_draft, origin, short_draft, test_date, TestEnv};
  use chrono::Days;

  #[test]
  fn test_create_batch_assigns_sequential_ids_from_one() {
    let env = TestEnv::new().unwrap();
    let today = test_date();

    let created = env
      .store
      .create_batch(vec![short_draft("Q1"), short_draft("Q2")], &origin(), today)
      .unwrap();

    let ids: Vec<_> = created.iter().map(|q| q.id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert!(created.iter().all(|q| q.level == Level::MIN && q.next_review_date == today));
    assert_eq!(created[0].created_at, created[1].created_at);
  }

  #[test]
  fn test_create_batch_continues_after_max_id() {
    let env = TestEnv::new().unwrap();
    let today = test_date();
    env
      .store
      .create_batch(vec![short_draft("a"), short_draft("b"), short_draft("c")], &origin(), today)
      .unwrap();

    let created = env
      .store
      .create_batch(vec![short_draft("d"), mc_draft(4)], &origin(), today)
      .unwrap();
    let ids: Vec<_> = created.iter().map(|q| q.id).collect();
    assert_eq!(ids, vec![4, 5]);
  }

  #[test]
  fn test_create_batch_with_invalid_draft_writes_nothing() {
    let env = TestEnv::new().unwrap();

    let err = env
      .store
      .create_batch(vec![short_draft("ok"), mc_draft(3)], &origin(), test_date())
      .unwrap_err();

    assert!(matches!(
      err,
      StoreError::Validation {
        index: 1,
        source: ValidationError::ChoiceCount { found: 3, .. }
      }
    ));
    assert!(env.store.query_all().unwrap().is_empty());
  }

  #[test]
  fn test_create_empty_batch_is_noop() {
    let env = TestEnv::new().unwrap();
    let created = env.store.create_batch(Vec::new(), &origin(), test_date()).unwrap();
    assert!(created.is_empty());
  }

  #[test]
  fn test_roundtrip_preserves_content() {
    let env = TestEnv::new().unwrap();
    let draft = mc_draft(4).with_explanation("Layer 3").with_image("img/osi.png");
    let created = env.store.create_batch(vec![draft], &origin(), test_date()).unwrap();

    let stored = env.store.get(created[0].id).unwrap().unwrap();
    assert_eq!(stored, created[0]);
    assert!(matches!(stored.kind, QuestionKind::MultipleChoice { .. }));
    assert_eq!(stored.kind.choices().len(), 4);
    assert_eq!(stored.explanation, "Layer 3");
    assert_eq!(stored.related_image_reference.as_deref(), Some("img/osi.png"));
  }

  #[test]
  fn test_get_unknown_id_is_none() {
    let env = TestEnv::new().unwrap();
    assert!(env.store.get(42).unwrap().is_none());
  }

  #[test]
  fn test_update_state_only_touches_review_fields() {
    let env = TestEnv::new().unwrap();
    let today = test_date();
    let created = env
      .store
      .create_batch(vec![short_draft("Q1"), short_draft("Q2")], &origin(), today)
      .unwrap();

    let next = today.checked_add_days(Days::new(2)).unwrap();
    env.store.update_state(1, Level::new(2).unwrap(), next).unwrap();

    let first = env.store.get(1).unwrap().unwrap();
    assert_eq!(first.level.get(), 2);
    assert_eq!(first.next_review_date, next);
    assert_eq!(first.question, created[0].question);
    assert_eq!(first.created_at, created[0].created_at);

    // The other record is untouched
    assert_eq!(env.store.get(2).unwrap().unwrap(), created[1]);
  }

  #[test]
  fn test_update_state_unknown_id_is_not_found() {
    let env = TestEnv::new().unwrap();
    let err = env.store.update_state(99, Level::MIN, test_date()).unwrap_err();
    assert!(matches!(err, StoreError::NotFound(99)));
  }

  #[test]
  fn test_query_due_includes_yesterday_and_today_only() {
    let env = TestEnv::new().unwrap();
    let today = test_date();
    let yesterday = today.pred_opt().unwrap();
    let tomorrow = today.succ_opt().unwrap();

    env
      .store
      .create_batch(vec![short_draft("y"), short_draft("t"), short_draft("m")], &origin(), yesterday)
      .unwrap();
    env.store.update_state(2, Level::MIN, today).unwrap();
    env.store.update_state(3, Level::MIN, tomorrow).unwrap();

    let due = env.store.query_due(today).unwrap();
    let ids: Vec<_> = due.iter().map(|q| q.id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(env.store.count_due(today).unwrap(), 2);
    assert_eq!(env.store.count_due(tomorrow).unwrap(), 3);
  }

  #[test]
  fn test_level_histogram_counts_every_level() {
    let env = TestEnv::new().unwrap();
    let today = test_date();
    env
      .store
      .create_batch(vec![short_draft("a"), short_draft("b"), short_draft("c")], &origin(), today)
      .unwrap();
    env.store.update_state(3, Level::MAX, today).unwrap();

    let histogram = env.store.level_histogram().unwrap();
    assert_eq!(histogram.len(), 5);
    assert_eq!(histogram[&Level::MIN], 2);
    assert_eq!(histogram[&Level::MAX], 1);
    assert_eq!(histogram[&Level::new(3).unwrap()], 0);
  }

  #[test]
  fn test_reopen_keeps_questions() {
    let env = TestEnv::new().unwrap();
    let path = env.path().join("reopen.db");
    {
      let store = SqliteStore::open(&path).unwrap();
      store.create_batch(vec![short_draft("persisted")], &origin(), test_date()).unwrap();
    }

    let reopened = SqliteStore::open(&path).unwrap();
    let all = reopened.query_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].question, "persisted");
  }

  #[test]
  fn test_concurrent_updates_to_different_ids() {
    let env = TestEnv::new().unwrap();
    let today = test_date();
    let drafts = (0..8).map(|i| short_draft(&format!("Q{}", i))).collect();
    env.store.create_batch(drafts, &origin(), today).unwrap();

    let handles: Vec<_> = (1..=8)
      .map(|id| {
        let store = env.store.clone();
        std::thread::spawn(move || {
          let level = Level::new((id % 5 + 1) as u8).unwrap();
          store.update_state(id, level, today).unwrap();
        })
      })
      .collect();
    for handle in handles {
      handle.join().unwrap();
    }

    for question in env.store.query_all().unwrap() {
      assert_eq!(question.level.get() as i64, question.id % 5 + 1);
    }
  }

  #[test]
  fn test_write_failure_mid_batch_rolls_back() {
    let env = TestEnv::new().unwrap();
    let today = test_date();
    env.store.create_batch(vec![short_draft("kept")], &origin(), today).unwrap();

    // Fail on the second row of the next batch (ids 2, 3)
    try_lock(env.store.pool())
      .unwrap()
      .execute_batch(
        r#"
        CREATE TRIGGER fail_second_insert BEFORE INSERT ON questions
        WHEN NEW.id = 3
        BEGIN
          SELECT RAISE(ABORT, 'disk full');
        END;
        "#,
      )
      .unwrap();

    let err = env
      .store
      .create_batch(vec![short_draft("a"), short_draft("b")], &origin(), today)
      .unwrap_err();
    assert!(matches!(err, StoreError::Database(_)));
    assert!(err.is_io());

    let all = env.store.query_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].question, "kept");
    assert_eq!(db::max_question_id(&try_lock(env.store.pool()).unwrap()).unwrap(), 1);
  }
}
