mod auth;
mod config;
mod db;
mod error;
mod game;
mod models;
mod password;
mod routes;
mod utils;

use std::sync::Arc;

use anyhow::{Context, Result};
use config::{Config, StoreBackend};
use db::{GameStore, MemoryStore, PgStore};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application state shared across all handlers
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn GameStore>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tictactoe_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting tic-tac-toe backend server...");

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    let store = connect_store(&config).await?;

    let state = Arc::new(AppState {
        config: config.clone(),
        store,
    });

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::create_routes()
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn connect_store(config: &Config) -> Result<Arc<dyn GameStore>> {
    match config.store.backend {
        StoreBackend::Postgres => {
            let url = config
                .database_url()
                .context("DATABASE_URL must be set when STORE_BACKEND is postgres")?;

            let pool = db::create_pool(url, config.database.max_connections).await?;
            tracing::info!("Connected to database");

            sqlx::migrate!("./migrations").run(&pool).await?;
            tracing::info!("Database migrations completed");

            Ok(Arc::new(PgStore::new(pool)))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; all users and games are lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
