//! In-memory registry of open review sessions.
//!
//! Sessions are keyed by a random id handed to the client when the session
//! starts. Entries auto-expire after a configurable duration of inactivity.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config;
use crate::srs::ReviewSession;

/// Session entry with last access time for expiration
struct SessionEntry {
  session: ReviewSession,
  last_access: DateTime<Utc>,
}

#[derive(Clone, Default)]
pub struct SessionRegistry {
  sessions: Arc<Mutex<HashMap<String, SessionEntry>>>,
}

impl SessionRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> MutexGuard<'_, HashMap<String, SessionEntry>> {
    // Entries are replaced whole, so a poisoned map is still consistent
    self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Register a session and return its id
  pub fn insert(&self, session: ReviewSession) -> String {
    let mut sessions = self.lock();

    // Clean up expired sessions occasionally (~10% chance)
    if rand::random::<u8>() < config::SESSION_CLEANUP_THRESHOLD {
      cleanup_expired(&mut sessions);
    }

    let id = generate_session_id();
    sessions.insert(
      id.clone(),
      SessionEntry {
        session,
        last_access: Utc::now(),
      },
    );
    id
  }

  /// Run `f` against a live session, refreshing its last access time.
  /// Returns None for unknown or expired ids.
  pub fn with_session<T>(&self, id: &str, f: impl FnOnce(&mut ReviewSession) -> T) -> Option<T> {
    let mut sessions = self.lock();
    let expiry = Utc::now() - Duration::hours(config::SESSION_EXPIRY_HOURS);

    if sessions.get(id).is_some_and(|entry| entry.last_access <= expiry) {
      sessions.remove(id);
      return None;
    }

    let entry = sessions.get_mut(id)?;
    entry.last_access = Utc::now();
    Some(f(&mut entry.session))
  }

  pub fn remove(&self, id: &str) -> bool {
    self.lock().remove(id).is_some()
  }

  pub fn len(&self) -> usize {
    self.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// Clean up expired sessions
fn cleanup_expired(sessions: &mut HashMap<String, SessionEntry>) {
  let expiry = Utc::now() - Duration::hours(config::SESSION_EXPIRY_HOURS);
  sessions.retain(|_, entry| entry.last_access > expiry);
}

/// Generate a new session ID
pub fn generate_session_id() -> String {
  use rand::Rng;
  let mut rng = rand::rng();
  (0..32)
    .map(|_| {
      let idx = rng.random_range(0..36);
      if idx < 10 {
        (b'0' + idx) as char
      } else {
        (b'a' + idx - 10) as char
      }
    })
    .collect()
}
