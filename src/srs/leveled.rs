use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::{Level, Question};

/// Days until the next review, indexed by level 1..=5
const INTERVAL_DAYS: [u64; 5] = [1, 2, 4, 7, 15];

/// Interval for a wrong answer, regardless of prior level
const RELEARN_INTERVAL_DAYS: u64 = 1;

/// Look up the review interval for a raw level.
/// Anything outside 1..=5 falls back to one day.
pub fn interval_days(level: i64) -> u64 {
  match level {
    1..=5 => INTERVAL_DAYS[(level - 1) as usize],
    _ => 1,
  }
}

/// Outcome of grading a single question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
  Correct,
  Incorrect,
}

impl Grade {
  pub fn from_correct(correct: bool) -> Self {
    if correct {
      Self::Correct
    } else {
      Self::Incorrect
    }
  }
}

/// New review state for a graded question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
  pub level: Level,
  pub next_review_date: NaiveDate,
}

pub fn grade_correct(item: &Question, today: NaiveDate) -> Transition {
  let level = item.level.promoted();
  Transition {
    level,
    next_review_date: advance(today, interval_days(level.get() as i64)),
  }
}

/// A miss always sends the question back to level 1, even from level 5
pub fn grade_incorrect(_item: &Question, today: NaiveDate) -> Transition {
  Transition {
    level: Level::MIN,
    next_review_date: advance(today, RELEARN_INTERVAL_DAYS),
  }
}

pub fn apply_grade(item: &Question, grade: Grade, today: NaiveDate) -> Transition {
  match grade {
    Grade::Correct => grade_correct(item, today),
    Grade::Incorrect => grade_incorrect(item, today),
  }
}

fn advance(today: NaiveDate, days: u64) -> NaiveDate {
  today.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX)
}
