use rusqlite::{Connection, Result};

pub fn run_migrations(conn: &Connection) -> Result<()> {
  // Ids are assigned explicitly (max + 1), never by AUTOINCREMENT.
  // CHECK constraints back up the invariants enforced by the domain types.
  conn.execute_batch(
    r#"
    CREATE TABLE IF NOT EXISTS questions (
      id INTEGER PRIMARY KEY,
      question_type TEXT NOT NULL
        CHECK (question_type IN ('multiple_choice', 'short_answer', 'subjective')),
      question TEXT NOT NULL,
      answer TEXT NOT NULL,
      explanation TEXT NOT NULL DEFAULT '',
      choices TEXT,
      related_image_reference TEXT,
      category TEXT NOT NULL,
      source_identifier TEXT NOT NULL,
      level INTEGER NOT NULL DEFAULT 1 CHECK (level BETWEEN 1 AND 5),
      next_review_date TEXT NOT NULL,
      created_at TEXT NOT NULL,
      CHECK (question_type != 'multiple_choice'
             OR (choices IS NOT NULL AND json_array_length(choices) = 4))
    );

    -- Indexes
    CREATE INDEX IF NOT EXISTS idx_questions_next_review_date ON questions(next_review_date);
    CREATE INDEX IF NOT EXISTS idx_questions_source ON questions(source_identifier);
    "#,
  )?;

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn insert(conn: &Connection, question_type: &str, choices: Option<&str>, level: i64) -> Result<usize> {
    conn.execute(
      r#"
      INSERT INTO questions (question_type, question, answer, choices, category, source_identifier,
                             level, next_review_date, created_at)
      VALUES (?1, 'q', 'a', ?2, 'general', 'doc.pdf', ?3, '2025-01-01', '2025-01-01T00:00:00Z')
      "#,
      rusqlite::params![question_type, choices, level],
    )
  }

  #[test]
  fn test_migrations_are_idempotent() {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();
    run_migrations(&conn).unwrap();
  }

  #[test]
  fn test_schema_rejects_level_out_of_range() {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();
    assert!(insert(&conn, "short_answer", None, 6).is_err());
    assert!(insert(&conn, "short_answer", None, 0).is_err());
    assert!(insert(&conn, "short_answer", None, 5).is_ok());
  }

  #[test]
  fn test_schema_rejects_multiple_choice_without_four_choices() {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();
    assert!(insert(&conn, "multiple_choice", Some(r#"["a","b","c"]"#), 1).is_err());
    assert!(insert(&conn, "multiple_choice", None, 1).is_err());
    assert!(insert(&conn, "multiple_choice", Some(r#"["a","b","c","d"]"#), 1).is_ok());
  }
}
