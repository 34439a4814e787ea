pub mod cache;
pub mod clock;
pub mod config;
pub mod controllers;
pub mod database;
pub mod error;
pub mod geometry;
pub mod middleware;
pub mod models;
pub mod redis_client;
pub mod services;
pub mod store;

use std::sync::Arc;

use crate::clock::SystemClock;
use crate::services::inventory::InventoryCoordinator;
use crate::services::seatmap::SeatMapReader;
use crate::store::PgInventoryStore;

// Shared state for the whole application
pub struct AppState {
    pub db: database::Database,
    pub redis: redis_client::RedisClient,
    pub cache: cache::CacheService,
    pub config: config::Config,
    pub store: Arc<PgInventoryStore>,
    pub inventory: InventoryCoordinator<PgInventoryStore>,
    pub seatmap: SeatMapReader<PgInventoryStore>,
}

impl AppState {
    pub async fn new(
        config: config::Config,
    ) -> Result<Arc<Self>, Box<dyn std::error::Error + Send + Sync>> {
        let db = database::Database::new(&config.database.url, config.database.pool_size).await?;

        db.run_migrations().await?;

        let redis = redis_client::RedisClient::new(&config.redis.url).await?;
        let cache = cache::CacheService::new(redis.clone());

        let store = Arc::new(PgInventoryStore::new(db.pool.clone()));
        let clock = Arc::new(SystemClock);
        let inventory = InventoryCoordinator::new(store.clone(), clock.clone());
        let seatmap = SeatMapReader::new(store.clone(), clock);

        Ok(Arc::new(Self {
            db,
            redis,
            cache,
            config,
            store,
            inventory,
            seatmap,
        }))
    }
}
