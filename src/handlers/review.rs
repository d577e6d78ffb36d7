//! Review session endpoints.
//!
//! The client starts a session, then loops: show the current item, reveal
//! the answer, grade it. Grading persists the new level and due date before
//! the session moves on.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{today, ApiError};
use crate::domain::{Level, QuestionId, QuestionType};
use crate::srs::{Grade, GradedItem, ReviewSession, SessionProgress, Transition};
use crate::state::AppState;

/// Display fields of the current item. Answer fields only appear once revealed.
#[derive(Debug, Serialize)]
pub struct ItemView {
  pub id: QuestionId,
  #[serde(rename = "type")]
  pub question_type: QuestionType,
  pub question: String,
  pub choices: Vec<String>,
  pub related_image_reference: Option<String>,
  pub level: Level,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub answer: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub explanation: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
  pub session_id: String,
  /// Nothing was due when the session started
  pub nothing_due: bool,
  pub complete: bool,
  pub progress: SessionProgress,
  pub item: Option<ItemView>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub last_graded: Option<GradedItem>,
}

impl SessionView {
  fn of(session_id: &str, session: &ReviewSession, last_graded: Option<GradedItem>) -> Self {
    let item = session.current().map(|q| {
      let revealed = session.answer_revealed();
      ItemView {
        id: q.id,
        question_type: q.question_type(),
        question: q.question.clone(),
        choices: q.kind.choices().to_vec(),
        related_image_reference: q.related_image_reference.clone(),
        level: q.level,
        answer: revealed.then(|| q.answer.clone()),
        explanation: revealed.then(|| q.explanation.clone()),
      }
    });

    Self {
      session_id: session_id.to_string(),
      nothing_due: session.is_empty(),
      complete: session.is_complete(),
      progress: session.progress(),
      item,
      last_graded,
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct GradeRequest {
  pub correct: bool,
}

pub async fn start_review(State(state): State<AppState>) -> Result<Json<SessionView>, ApiError> {
  let session = ReviewSession::start(state.store.as_ref(), today())?;
  let id = state.sessions.insert(session);
  state
    .sessions
    .with_session(&id, |session| SessionView::of(&id, session, None))
    .map(Json)
    .ok_or(ApiError::SessionNotFound(id))
}

pub async fn show_review(
  State(state): State<AppState>,
  Path(id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
  state
    .sessions
    .with_session(&id, |session| SessionView::of(&id, session, None))
    .map(Json)
    .ok_or(ApiError::SessionNotFound(id))
}

pub async fn reveal_answer(
  State(state): State<AppState>,
  Path(id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
  state
    .sessions
    .with_session(&id, |session| {
      session.reveal_answer();
      SessionView::of(&id, session, None)
    })
    .map(Json)
    .ok_or(ApiError::SessionNotFound(id))
}

/// The store write happens outside the registry lock; the cursor only
/// advances once it has succeeded.
pub async fn grade_review(
  State(state): State<AppState>,
  Path(id): Path<String>,
  Json(request): Json<GradeRequest>,
) -> Result<Json<SessionView>, ApiError> {
  let grade = Grade::from_correct(request.correct);
  let as_of = today();

  let pending = state
    .sessions
    .with_session(&id, |session| session.preview_grade(grade, as_of))
    .ok_or_else(|| ApiError::SessionNotFound(id.clone()))?;

  if let Some(graded) = &pending {
    let Transition {
      level,
      next_review_date,
    } = graded.transition;
    state.store.update_state(graded.id, level, next_review_date)?;
  }

  state
    .sessions
    .with_session(&id, |session| {
      if let Some(graded) = &pending {
        session.record_grade(graded);
      }
      SessionView::of(&id, session, pending)
    })
    .map(Json)
    .ok_or(ApiError::SessionNotFound(id))
}
