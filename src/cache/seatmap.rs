use redis::AsyncCommands;
use tracing::info;

use crate::cache::CacheService;

impl CacheService {
    /// Cached neutral (no-viewer) seat map JSON, if present.
    pub async fn get_seat_map(&self, instance_id: i64) -> Option<String> {
        let mut conn = self.redis.conn.clone();
        let key = seat_map_key(instance_id);
        conn.get(key).await.ok()
    }

    pub async fn save_seat_map(&self, instance_id: i64, json: &str, ttl_seconds: u64) {
        let mut conn = self.redis.conn.clone();
        let key = seat_map_key(instance_id);
        let _: Result<(), _> = conn.set_ex(key, json, ttl_seconds).await;
    }

    /// Drop the cached map after any status transition so polling clients
    /// pick up the change on their next request.
    pub async fn invalidate_seat_map(&self, instance_id: i64) {
        let mut conn = self.redis.conn.clone();
        let key = seat_map_key(instance_id);
        let _: Result<(), _> = conn.del(&key).await;
        info!("Invalidated seat map cache for instance {}", instance_id);
    }
}

fn seat_map_key(instance_id: i64) -> String {
    format!("seatmap:{}", instance_id)
}
