//! Application state shared by all handlers.

use std::sync::Arc;

use crate::session::SessionRegistry;
use crate::store::QuestionStore;

/// Application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
  /// Question store (SQLite or JSON document)
  pub store: Arc<dyn QuestionStore>,

  /// Open review sessions keyed by session id
  pub sessions: SessionRegistry,
}

impl AppState {
  pub fn new(store: Arc<dyn QuestionStore>) -> Self {
    Self {
      store,
      sessions: SessionRegistry::new(),
    }
  }
}
