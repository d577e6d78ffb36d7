//! Question ingestion, listing and statistics.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::{today, ApiError};
use crate::domain::{BatchOrigin, Question};
use crate::ingest::{ingest_json, IngestReport};
use crate::state::AppState;
use crate::stats::{collect_stats, StudyStats};

fn default_category() -> String {
  "general".to_string()
}

/// Drafts produced from one document
#[derive(Debug, Deserialize)]
pub struct IngestRequest {
  pub source_identifier: String,
  #[serde(default = "default_category")]
  pub category: String,
  /// Parsed one by one so a malformed item only rejects itself
  pub drafts: Vec<serde_json::Value>,
}

pub async fn create_questions(
  State(state): State<AppState>,
  Json(request): Json<IngestRequest>,
) -> Result<(StatusCode, Json<IngestReport>), ApiError> {
  let origin = BatchOrigin::new(request.source_identifier, request.category);
  let report = ingest_json(state.store.as_ref(), request.drafts, &origin, today())?;
  Ok((StatusCode::CREATED, Json(report)))
}

pub async fn list_questions(State(state): State<AppState>) -> Result<Json<Vec<Question>>, ApiError> {
  Ok(Json(state.store.query_all()?))
}

pub async fn stats(State(state): State<AppState>) -> Result<Json<StudyStats>, ApiError> {
  Ok(Json(collect_stats(state.store.as_ref(), today())?))
}
