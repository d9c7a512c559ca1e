//! Cafe Cammi - conversational ordering bot
//!
//! Takes a customer through picking a dish and a plate count, then
//! announces the total. Each conversation's order is persisted in `SQLite`.

mod api;
mod config;
mod db;
mod menu;
mod quantity;
mod runtime;
mod state_machine;

use api::{create_router, AppState};
use config::ServerConfig;
use db::Database;
use menu::MenuCatalog;
use runtime::RuntimeManager;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cafe_cammi=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = ServerConfig::from_env();

    let menu = match &config.menu_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading menu");
            MenuCatalog::from_json_file(path)?
        }
        None => MenuCatalog::cafe_cammi(),
    };
    tracing::info!(items = menu.items().len(), "Menu ready");

    // Ensure database directory exists
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::info!(path = %config.db_path.display(), "Opening database");
    let db = Database::open(&config.db_path)?;

    let runtime = RuntimeManager::new(db, Arc::new(menu), config.turn_timeout);
    let state = AppState::new(runtime);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(compression);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Cafe Cammi listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
