use crate::redis_client::RedisClient;

pub mod seatmap;

/// Redis-backed read cache. Best-effort: a Redis failure degrades to
/// straight database reads, never to an error.
#[derive(Clone)]
pub struct CacheService {
    pub(crate) redis: RedisClient,
}

impl CacheService {
    pub fn new(redis: RedisClient) -> Self {
        Self { redis }
    }
}
