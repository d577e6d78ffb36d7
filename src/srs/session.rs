//! Review sessions: building today's queue and walking it once.
//!
//! A session is a forward-only cursor over the due set. Each grading
//! decision is persisted through the store before the cursor moves, so an
//! abandoned session never leaves anything half-applied.

use chrono::NaiveDate;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use super::leveled::{apply_grade, Grade, Transition};
use crate::domain::{Question, QuestionId};
use crate::store::{QuestionStore, Result};

/// Order candidates by due date, most mastered first within a day
pub fn sort_candidates(items: &mut [Question]) {
  items.sort_by(|a, b| {
    a.next_review_date
      .cmp(&b.next_review_date)
      .then_with(|| b.level.cmp(&a.level))
  });
}

/// Build the presentation order for a review session.
///
/// Items not yet due on `today` are dropped even if the caller already
/// filtered. The remaining items are sorted, then the whole sequence is
/// shuffled, so the final order is a uniform random permutation.
pub fn build_session<R: Rng + ?Sized>(due_items: Vec<Question>, today: NaiveDate, rng: &mut R) -> Vec<Question> {
  let mut items: Vec<Question> = due_items.into_iter().filter(|q| q.is_due(today)).collect();
  sort_candidates(&mut items);
  items.shuffle(rng);
  items
}

/// Result of one grading step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GradedItem {
  pub id: QuestionId,
  pub grade: Grade,
  #[serde(flatten)]
  pub transition: Transition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionProgress {
  /// Items already graded
  pub done: usize,
  pub total: usize,
  pub correct: usize,
}

#[derive(Debug, Clone)]
pub struct ReviewSession {
  items: Vec<Question>,
  position: usize,
  answer_revealed: bool,
  correct: usize,
}

impl ReviewSession {
  /// Load today's due set from the store and shuffle it
  pub fn start(store: &dyn QuestionStore, today: NaiveDate) -> Result<Self> {
    let due = store.query_due(today)?;
    let session = Self::from_due(due, today, &mut rand::rng());
    tracing::info!("Review session started with {} due questions", session.len());
    Ok(session)
  }

  pub fn from_due<R: Rng + ?Sized>(due: Vec<Question>, today: NaiveDate, rng: &mut R) -> Self {
    Self {
      items: build_session(due, today, rng),
      position: 0,
      answer_revealed: false,
      correct: 0,
    }
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  /// Nothing was due when the session was built
  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn is_complete(&self) -> bool {
    self.position >= self.items.len()
  }

  pub fn current(&self) -> Option<&Question> {
    self.items.get(self.position)
  }

  pub fn items(&self) -> &[Question] {
    &self.items
  }

  pub fn answer_revealed(&self) -> bool {
    self.answer_revealed
  }

  /// Show the answer for the current item
  pub fn reveal_answer(&mut self) -> Option<&Question> {
    if self.is_complete() {
      return None;
    }
    self.answer_revealed = true;
    self.current()
  }

  pub fn progress(&self) -> SessionProgress {
    SessionProgress {
      done: self.position.min(self.items.len()),
      total: self.items.len(),
      correct: self.correct,
    }
  }

  /// Transition the current item would get under `grade`. Touches nothing.
  pub fn preview_grade(&self, grade: Grade, today: NaiveDate) -> Option<GradedItem> {
    let item = self.current()?;
    Some(GradedItem {
      id: item.id,
      grade,
      transition: apply_grade(item, grade, today),
    })
  }

  /// Move past `graded` once its new state is persisted.
  ///
  /// Returns false and leaves the cursor alone when the current item is no
  /// longer the one that was graded.
  pub fn record_grade(&mut self, graded: &GradedItem) -> bool {
    if self.current().map(|q| q.id) != Some(graded.id) {
      return false;
    }

    self.position += 1;
    self.answer_revealed = false;
    if graded.grade == Grade::Correct {
      self.correct += 1;
    }
    true
  }

  /// Grade the current item, persist the new state, then advance.
  ///
  /// Returns `Ok(None)` once the session is complete. On a store error the
  /// cursor stays on the same item.
  pub fn grade(
    &mut self,
    store: &dyn QuestionStore,
    grade: Grade,
    today: NaiveDate,
  ) -> Result<Option<GradedItem>> {
    let Some(graded) = self.preview_grade(grade, today) else {
      return Ok(None);
    };

    store.update_state(graded.id, graded.transition.level, graded.transition.next_review_date)?;
    self.record_grade(&graded);
    Ok(Some(graded))
  }
}
