use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use study_notebook::{config, handlers, state::AppState, store};

#[tokio::main]
async fn main() {
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "study_notebook=debug,tower_http=debug".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  let store_config = config::load_store_config();
  let store = store::open_store(&store_config).expect("Failed to open question store");

  match store.count_due(handlers::today()) {
    Ok(due) => tracing::info!("{} questions due today", due),
    Err(e) => tracing::warn!("Could not count due questions: {}", e),
  }

  let app = handlers::router(AppState::new(store));

  let bind_addr = config::server_bind_addr();
  let listener = tokio::net::TcpListener::bind(&bind_addr)
    .await
    .unwrap_or_else(|_| panic!("Failed to bind to {}", bind_addr));

  tracing::info!("Server running on http://{}", bind_addr);

  axum::serve(listener, app)
    .await
    .expect("Server failed to start");
}
