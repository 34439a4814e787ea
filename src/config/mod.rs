use serde::Deserialize;
use std::env;

// Top-level configuration container
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub hold: HoldConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

// Knobs for the hold ledger and its eviction
#[derive(Debug, Clone, Deserialize)]
pub struct HoldConfig {
    /// TTL applied when the client does not ask for one.
    pub default_ttl_seconds: i64,
    /// Upper bound on client-requested TTLs.
    pub max_ttl_seconds: i64,
    /// How often the background sweep runs.
    pub sweep_interval_seconds: u64,
    /// TTL of the cached neutral seat map.
    pub seatmap_cache_ttl_seconds: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            app: AppConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8000".to_string())
                    .parse()
                    .expect("PORT must be a valid number"),
                environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
                rust_log: env::var("RUST_LOG")
                    .unwrap_or_else(|_| "seating_service=debug,tower_http=debug".to_string()),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
                pool_size: env::var("DB_POOL_SIZE")
                    .unwrap_or_else(|_| "20".to_string())
                    .parse()
                    .expect("DB_POOL_SIZE must be a valid number"),
            },
            redis: RedisConfig {
                url: env::var("REDIS_URL").expect("REDIS_URL must be set"),
            },
            hold: HoldConfig {
                default_ttl_seconds: env::var("HOLD_DEFAULT_TTL_SECONDS")
                    .unwrap_or_else(|_| "300".to_string())
                    .parse()
                    .expect("HOLD_DEFAULT_TTL_SECONDS must be a valid number"),
                max_ttl_seconds: env::var("HOLD_MAX_TTL_SECONDS")
                    .unwrap_or_else(|_| "900".to_string())
                    .parse()
                    .expect("HOLD_MAX_TTL_SECONDS must be a valid number"),
                sweep_interval_seconds: env::var("HOLD_SWEEP_INTERVAL_SECONDS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .expect("HOLD_SWEEP_INTERVAL_SECONDS must be a valid number"),
                seatmap_cache_ttl_seconds: env::var("SEATMAP_CACHE_TTL_SECONDS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .expect("SEATMAP_CACHE_TTL_SECONDS must be a valid number"),
            },
        }
    }
}
