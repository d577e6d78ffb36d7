//! Question CRUD and due-date queries

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Result, Row};

use crate::domain::{Level, Question, QuestionId, QuestionKind, QuestionType, CHOICE_COUNT};

const QUESTION_COLUMNS: &str = r#"
  id, question_type, question, answer, explanation, choices, related_image_reference,
  category, source_identifier, level, next_review_date, created_at
"#;

/// A stored value that no longer satisfies the question model
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct CorruptColumn(String);

/// Highest assigned id, 0 for an empty table
pub fn max_question_id(conn: &Connection) -> Result<QuestionId> {
  conn.query_row("SELECT COALESCE(MAX(id), 0) FROM questions", [], |row| row.get(0))
}

pub fn insert_question(conn: &Connection, question: &Question) -> Result<()> {
  let choices = match &question.kind {
    QuestionKind::MultipleChoice { choices } => Some(
      serde_json::to_string(choices)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?,
    ),
    _ => None,
  };

  conn.execute(
    r#"
    INSERT INTO questions (id, question_type, question, answer, explanation, choices,
                           related_image_reference, category, source_identifier, level,
                           next_review_date, created_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
    "#,
    params![
      question.id,
      question.question_type().as_str(),
      question.question,
      question.answer,
      question.explanation,
      choices,
      question.related_image_reference,
      question.category,
      question.source_identifier,
      question.level.get(),
      question.next_review_date.to_string(),
      question.created_at.to_rfc3339(),
    ],
  )?;
  Ok(())
}

pub fn get_question_by_id(conn: &Connection, id: QuestionId) -> Result<Option<Question>> {
  let mut stmt = conn.prepare(&format!("SELECT {} FROM questions WHERE id = ?1", QUESTION_COLUMNS))?;

  let mut rows = stmt.query(params![id])?;
  if let Some(row) = rows.next()? {
    Ok(Some(row_to_question(row)?))
  } else {
    Ok(None)
  }
}

/// Questions due on or before `as_of`. ISO dates compare correctly as text.
pub fn get_due_questions(conn: &Connection, as_of: NaiveDate) -> Result<Vec<Question>> {
  let mut stmt = conn.prepare(&format!(
    r#"
  SELECT {}
  FROM questions
  WHERE next_review_date <= ?1
  ORDER BY next_review_date ASC, id ASC
  "#,
    QUESTION_COLUMNS
  ))?;

  let questions = stmt
    .query_map(params![as_of.to_string()], |row| row_to_question(row))?
    .collect::<Result<Vec<_>>>()?;
  Ok(questions)
}

pub fn get_all_questions(conn: &Connection) -> Result<Vec<Question>> {
  let mut stmt = conn.prepare(&format!("SELECT {} FROM questions ORDER BY id ASC", QUESTION_COLUMNS))?;

  let questions = stmt
    .query_map([], |row| row_to_question(row))?
    .collect::<Result<Vec<_>>>()?;
  Ok(questions)
}

/// Overwrite level and due date. Returns the number of rows touched (0 or 1).
pub fn update_question_state(
  conn: &Connection,
  id: QuestionId,
  level: Level,
  next_review_date: NaiveDate,
) -> Result<usize> {
  conn.execute(
    "UPDATE questions SET level = ?1, next_review_date = ?2 WHERE id = ?3",
    params![level.get(), next_review_date.to_string(), id],
  )
}

/// (level, count) pairs for levels that have at least one question
pub fn get_level_counts(conn: &Connection) -> Result<Vec<(Level, usize)>> {
  let mut stmt = conn.prepare("SELECT level, COUNT(*) FROM questions GROUP BY level ORDER BY level")?;

  let counts = stmt
    .query_map([], |row| {
      let level: i64 = row.get(0)?;
      let count: i64 = row.get(1)?;
      let level = Level::from_raw(level).map_err(|e| corrupt(0, e.to_string()))?;
      Ok((level, count as usize))
    })?
    .collect::<Result<Vec<_>>>()?;
  Ok(counts)
}

pub fn count_due_questions(conn: &Connection, as_of: NaiveDate) -> Result<i64> {
  conn.query_row(
    "SELECT COUNT(*) FROM questions WHERE next_review_date <= ?1",
    params![as_of.to_string()],
    |row| row.get(0),
  )
}

fn corrupt(column: usize, message: String) -> rusqlite::Error {
  rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(CorruptColumn(message)))
}

fn row_to_question(row: &Row) -> Result<Question> {
  let type_str: String = row.get(1)?;
  let choices_json: Option<String> = row.get(5)?;
  let level: i64 = row.get(9)?;
  let next_review_str: String = row.get(10)?;
  let created_at_str: String = row.get(11)?;

  let question_type = QuestionType::from_str(&type_str)
    .ok_or_else(|| corrupt(1, format!("unknown question type '{}'", type_str)))?;

  let kind = match question_type {
    QuestionType::MultipleChoice => {
      let choices: Vec<String> = serde_json::from_str(choices_json.as_deref().unwrap_or("[]"))
        .map_err(|e| corrupt(5, e.to_string()))?;
      let found = choices.len();
      let choices = <[String; CHOICE_COUNT]>::try_from(choices)
        .map_err(|_| corrupt(5, format!("expected {} choices, found {}", CHOICE_COUNT, found)))?;
      QuestionKind::MultipleChoice { choices }
    }
    QuestionType::ShortAnswer => QuestionKind::ShortAnswer,
    QuestionType::Subjective => QuestionKind::Subjective,
  };

  Ok(Question {
    id: row.get(0)?,
    kind,
    question: row.get(2)?,
    answer: row.get(3)?,
    explanation: row.get(4)?,
    related_image_reference: row.get(6)?,
    category: row.get(7)?,
    source_identifier: row.get(8)?,
    level: Level::from_raw(level).map_err(|e| corrupt(9, e.to_string()))?,
    next_review_date: next_review_str
      .parse::<NaiveDate>()
      .map_err(|e| corrupt(10, e.to_string()))?,
    created_at: DateTime::parse_from_rfc3339(&created_at_str)
      .map(|dt| dt.with_timezone(&Utc))
      .map_err(|e| corrupt(11, e.to_string()))?,
  })
}
