use axum::{extract::State, routing::get, Json, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use seating_service::{
    clock::SystemClock,
    config::Config,
    controllers,
    services::sweep::ReclaimSweeper,
    AppState,
};

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

    info!("Starting seating inventory service");

    let app_state = AppState::new(config.clone())
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    info!("Database and Redis connected");

    // --- Start background tasks ---

    // Reclaim sweep: frees seats whose holds expired without release/confirm
    let sweeper = ReclaimSweeper::new(
        app_state.store.clone(),
        app_state.inventory.clone(),
        Arc::new(SystemClock),
        Some(app_state.cache.clone()),
    );
    let sweep_interval = Duration::from_secs(config.hold.sweep_interval_seconds);
    task::spawn(async move {
        loop {
            sweeper.run_once().await;
            tokio::time::sleep(sweep_interval).await;
        }
    });

    // --- Start the web server ---

    let app = Router::new()
        .route("/", get(|| async { "Seating Inventory API v1.0" }))
        .route("/health", get(health))
        .nest("/api", controllers::routes())
        .with_state(app_state.clone())
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.app.port));
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let db_ok = state.db.ping().await;
    let redis_ok = state.redis.ping().await;
    Json(serde_json::json!({
        "database": db_ok,
        "redis": redis_ok,
    }))
}
