use std::sync::Arc;

use axum::{
    routing::{get, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

mod coerce;
mod commands;
mod config;
mod db;
mod error;
mod handlers;
mod models;
mod query;
mod report;
mod seed;

use crate::config::Config;
use crate::db::{MemoryProductStore, PgProductStore, ProductStore};

/// Shared application state. The store handle is passed to every handler
/// explicitly; cloning is an `Arc` bump.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ProductStore>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (ignored in production where env vars are injected)
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,inventory_service=debug")),
        )
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;

    info!("Inventory Service starting");

    let store = connect_store(&config).await?;

    // Requests are only accepted once seeding has finished.
    let seeded = seed::seed_store(
        store.as_ref(),
        config.seed_file.as_deref(),
        config.reseed_on_startup,
    )
    .await?;
    info!(cleared = seeded.cleared, inserted = seeded.inserted, "Startup seeding finished");

    let app = build_router(AppState { store });

    let addr = format!("{}:{}", config.host, config.port);
    info!("Listening on http://{}", addr);
    info!("API documentation at http://{}/swag", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn connect_store(config: &Config) -> anyhow::Result<Arc<dyn ProductStore>> {
    let Some(database_url) = &config.database_url else {
        warn!("DATABASE_URL not set, using the in-memory store; data is lost on exit");
        return Ok(Arc::new(MemoryProductStore::new()));
    };

    info!("Connecting to PostgreSQL...");
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(database_url)
        .await?;
    info!("Database connection pool established.");

    info!("Running migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Migrations complete.");

    Ok(Arc::new(PgProductStore::new(pool)))
}

fn build_router(state: AppState) -> Router {
    Router::new()
        // ── Health & docs ───────────────────────────────────────────────────
        .route("/health", get(handlers::health))
        .route("/swag", get(handlers::api_docs))

        // ── Products ────────────────────────────────────────────────────────
        .route(
            "/products",
            get(handlers::products::list_products).post(handlers::products::create_product),
        )
        .route(
            "/products/:id",
            put(handlers::products::update_product)
                .delete(handlers::products::delete_product),
        )

        // ── Report ──────────────────────────────────────────────────────────
        .route("/inventory-report", get(handlers::report::inventory_report))

        // ── Middleware ──────────────────────────────────────────────────────
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
