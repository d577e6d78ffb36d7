pub mod questions;
pub mod review;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Local, NaiveDate};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::store::StoreError;

pub use questions::{create_questions, list_questions, stats};
pub use review::{grade_review, reveal_answer, show_review, start_review};

/// Calendar date reviews are scheduled against
pub fn today() -> NaiveDate {
  Local::now().date_naive()
}

pub fn router(state: AppState) -> Router {
  Router::new()
    .route("/health", get(health))
    .route("/stats", get(stats))
    .route("/questions", get(list_questions).post(create_questions))
    .route("/review/sessions", post(start_review))
    .route("/review/sessions/{id}", get(show_review))
    .route("/review/sessions/{id}/reveal", post(reveal_answer))
    .route("/review/sessions/{id}/grade", post(grade_review))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

pub async fn health() -> &'static str {
  "ok"
}

/// Error type for JSON handlers
#[derive(Debug)]
pub enum ApiError {
  Store(StoreError),
  SessionNotFound(String),
}

impl From<StoreError> for ApiError {
  fn from(e: StoreError) -> Self {
    Self::Store(e)
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      Self::SessionNotFound(id) => (StatusCode::NOT_FOUND, format!("review session not found: {}", id)),
      Self::Store(e @ StoreError::NotFound(_)) => (StatusCode::NOT_FOUND, e.to_string()),
      Self::Store(e @ StoreError::Validation { .. }) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
      Self::Store(e) => {
        tracing::error!("Store failure: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "storage error".to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
