pub mod config;
pub mod db;
pub mod domain;
pub mod handlers;
pub mod ingest;
pub mod session;
pub mod srs;
pub mod state;
pub mod stats;
pub mod store;

#[cfg(test)]
pub mod testing;
