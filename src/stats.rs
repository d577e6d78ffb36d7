//! Study statistics for the progress overview

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::Level;
use crate::store::{QuestionStore, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelCount {
  pub level: Level,
  pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudyStats {
  pub total: usize,
  /// Questions at the top level. They keep being scheduled.
  pub mastered: usize,
  pub due_today: usize,
  pub levels: Vec<LevelCount>,
}

impl StudyStats {
  pub fn mastered_percentage(&self) -> usize {
    if self.total > 0 {
      (self.mastered * 100) / self.total
    } else {
      0
    }
  }
}

pub fn collect_stats(store: &dyn QuestionStore, today: NaiveDate) -> Result<StudyStats> {
  let histogram = store.level_histogram()?;
  let due_today = store.count_due(today)?;

  let total = histogram.values().sum();
  let mastered = histogram.get(&Level::MAX).copied().unwrap_or(0);
  let levels = histogram
    .into_iter()
    .map(|(level, count)| LevelCount { level, count })
    .collect();

  Ok(StudyStats {
    total,
    mastered,
    due_today,
    levels,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::{origin, short_draft, test_date, TestEnv};

  #[test]
  fn test_stats_on_empty_store() {
    let env = TestEnv::new().unwrap();
    let stats = collect_stats(&env.store, test_date()).unwrap();
    assert_eq!(stats.total, 0);
    assert_eq!(stats.mastered, 0);
    assert_eq!(stats.due_today, 0);
    assert_eq!(stats.levels.len(), 5);
    assert_eq!(stats.mastered_percentage(), 0);
  }

  #[test]
  fn test_stats_counts_mastered_and_due() {
    let env = TestEnv::new().unwrap();
    let today = test_date();
    let drafts = (0..4).map(|i| short_draft(&format!("Q{}", i))).collect();
    env.store.create_batch(drafts, &origin(), today).unwrap();
    env.store.update_state(1, Level::MAX, today.succ_opt().unwrap()).unwrap();

    let stats = collect_stats(&env.store, today).unwrap();
    assert_eq!(stats.total, 4);
    assert_eq!(stats.mastered, 1);
    assert_eq!(stats.due_today, 3);
    assert_eq!(stats.mastered_percentage(), 25);
    assert_eq!(stats.levels[0], LevelCount { level: Level::MIN, count: 3 });
    assert_eq!(stats.levels[4], LevelCount { level: Level::MAX, count: 1 });
  }

  #[test]
  fn test_stats_same_for_json_backend() {
    let env = TestEnv::new().unwrap();
    let store = env.json_store("review_db.json").unwrap();
    let today = test_date();
    store.create_batch(vec![short_draft("a")], &origin(), today).unwrap();

    let stats = collect_stats(&store, today).unwrap();
    assert_eq!(stats.total, 1);
    assert_eq!(stats.due_today, 1);
  }
}
