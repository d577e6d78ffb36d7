//! Application configuration.
//!
//! Values are resolved with priority: config.toml > environment (.env) > default.

use serde::Deserialize;
use std::path::PathBuf;

// ==================== Database Configuration ====================

/// Configuration file structure for config.toml
#[derive(Debug, Default, Deserialize)]
struct AppConfig {
  database: Option<DatabaseConfig>,
  server: Option<ServerConfig>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabaseConfig {
  path: Option<String>,
  backend: Option<StoreBackend>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerConfig {
  addr: Option<String>,
  port: Option<u16>,
}

/// Which medium holds the questions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
  #[default]
  Sqlite,
  Json,
}

impl StoreBackend {
  pub fn from_str(s: &str) -> Option<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "sqlite" => Some(Self::Sqlite),
      "json" => Some(Self::Json),
      _ => None,
    }
  }

  fn default_path(&self) -> PathBuf {
    match self {
      Self::Sqlite => PathBuf::from(DEFAULT_DB_PATH),
      Self::Json => PathBuf::from(DEFAULT_JSON_PATH),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
  pub backend: StoreBackend,
  pub path: PathBuf,
}

/// Default SQLite database location
pub const DEFAULT_DB_PATH: &str = "data/study.db";

/// Default JSON document location
pub const DEFAULT_JSON_PATH: &str = "data/review_db.json";

fn read_config_file() -> AppConfig {
  let Ok(contents) = std::fs::read_to_string("config.toml") else {
    return AppConfig::default();
  };
  match toml::from_str::<AppConfig>(&contents) {
    Ok(config) => config,
    Err(e) => {
      tracing::warn!("Ignoring malformed config.toml: {}", e);
      AppConfig::default()
    }
  }
}

/// Load store settings with priority: config.toml > .env > default
pub fn load_store_config() -> StoreConfig {
  // Load .env file if present
  let _ = dotenvy::dotenv();

  let file = read_config_file().database.unwrap_or_default();
  let env_backend = std::env::var("DATABASE_BACKEND")
    .ok()
    .and_then(|s| StoreBackend::from_str(&s));
  let env_path = std::env::var("DATABASE_PATH").ok();

  resolve_store_config(file, env_backend, env_path)
}

fn resolve_store_config(
  file: DatabaseConfig,
  env_backend: Option<StoreBackend>,
  env_path: Option<String>,
) -> StoreConfig {
  let backend = file.backend.or(env_backend).unwrap_or_default();

  let path = if let Some(path) = file.path {
    tracing::info!("Using database from config.toml: {}", path);
    PathBuf::from(path)
  } else if let Some(path) = env_path {
    tracing::info!("Using database from DATABASE_PATH env: {}", path);
    PathBuf::from(path)
  } else {
    let default = backend.default_path();
    tracing::info!("Using default database path: {}", default.display());
    default
  };

  StoreConfig { backend, path }
}

// ==================== Server Configuration ====================

/// Server address to bind to
pub const SERVER_ADDR: &str = "0.0.0.0";

/// Server port
pub const SERVER_PORT: u16 = 3000;

/// Get the full server bind address
pub fn server_bind_addr() -> String {
  let server = read_config_file().server.unwrap_or_default();
  let env_port = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse().ok());

  let addr = server.addr.unwrap_or_else(|| SERVER_ADDR.to_string());
  let port = server.port.or(env_port).unwrap_or(SERVER_PORT);
  format!("{}:{}", addr, port)
}

// ==================== Session Configuration ====================

/// Review session expiration time in hours of inactivity
pub const SESSION_EXPIRY_HOURS: i64 = 1;

/// Probability threshold for session cleanup (0-255, lower = more frequent)
/// Value of 25 means ~10% chance (25/256) on each session access
pub const SESSION_CLEANUP_THRESHOLD: u8 = 25;
