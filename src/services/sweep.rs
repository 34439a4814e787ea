//! Background reclaim sweep.
//!
//! Timer-driven eviction for the hold ledger: finds instances carrying
//! expired holds and runs the coordinator's reclaim over each. Shares no
//! state with request handlers beyond the store, and relies on the same
//! conditional writes, so it can run concurrently with live checkout
//! traffic (and with itself).

use std::sync::Arc;

use tracing::{error, info};

use crate::cache::CacheService;
use crate::clock::Clock;
use crate::services::inventory::InventoryCoordinator;
use crate::store::InventoryStore;

pub struct ReclaimSweeper<S> {
    store: Arc<S>,
    coordinator: InventoryCoordinator<S>,
    clock: Arc<dyn Clock>,
    cache: Option<CacheService>,
}

impl<S: InventoryStore> ReclaimSweeper<S> {
    pub fn new(
        store: Arc<S>,
        coordinator: InventoryCoordinator<S>,
        clock: Arc<dyn Clock>,
        cache: Option<CacheService>,
    ) -> Self {
        Self {
            store,
            coordinator,
            clock,
            cache,
        }
    }

    /// One full pass over every instance with something to reclaim.
    /// A failing instance is logged and skipped so one bad apple never
    /// starves the rest of the sweep.
    pub async fn run_once(&self) -> SweepStats {
        let now = self.clock.now();
        let instance_ids = match self.store.instances_with_expired_holds(now).await {
            Ok(ids) => ids,
            Err(e) => {
                error!("sweep: failed to list instances with expired holds: {e}");
                return SweepStats::default();
            }
        };

        if instance_ids.is_empty() {
            return SweepStats::default();
        }

        info!("🧹 sweep: {} instance(s) with expired holds", instance_ids.len());

        let mut stats = SweepStats::default();
        for instance_id in instance_ids {
            match self.coordinator.reclaim_expired(instance_id).await {
                Ok(reclaimed) => {
                    stats.instances_swept += 1;
                    stats.seats_reclaimed += reclaimed;
                    if reclaimed > 0 {
                        if let Some(cache) = &self.cache {
                            cache.invalidate_seat_map(instance_id).await;
                        }
                    }
                }
                Err(e) => {
                    error!(instance_id, "sweep: reclaim failed: {e}");
                    stats.instances_failed += 1;
                }
            }
        }

        info!(
            "✅ sweep done: {} seat(s) reclaimed across {} instance(s)",
            stats.seats_reclaimed, stats.instances_swept
        );
        stats
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepStats {
    pub instances_swept: u64,
    pub instances_failed: u64,
    pub seats_reclaimed: u64,
}
