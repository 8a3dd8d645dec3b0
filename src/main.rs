use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cinema_system::clock::SystemClock;
use cinema_system::config::Config;
use cinema_system::controllers;
use cinema_system::repository::postgres::PostgresRepository;
use cinema_system::AppState;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.app.rust_log))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting cinema booking engine");

    let repository = PostgresRepository::connect(
        &config.database.url,
        config.database.pool_size,
        config.room.layout(),
    )
    .await
    .context("failed to connect to database")?;
    info!("Database connected");

    repository
        .run_migrations()
        .await
        .context("failed to run migrations")?;

    let state = AppState::new(Arc::new(repository), Arc::new(SystemClock), config.clone());

    let app = Router::new()
        .route("/", get(|| async { "Cinema booking API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        .nest("/api", controllers::routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let host: std::net::IpAddr = config
        .app
        .host
        .parse()
        .context("HOST must be an IP address")?;
    let addr = SocketAddr::new(host, config.app.port);
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app.into_make_service())
        .await
        .context("server terminated")?;
    Ok(())
}
