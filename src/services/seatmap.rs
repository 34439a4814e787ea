//! Seat map reader.
//!
//! Read-side projection of the inventory: walks the instance's frozen
//! geometry, joins each seat against its inventory row and any live hold,
//! and classifies availability relative to the viewing session. A seat whose
//! hold has expired is already shown as available here; the physical row is
//! freed by the sweep or by the next hold attempt.

use std::collections::HashMap;
use std::sync::Arc;

use crate::clock::Clock;
use crate::error::InventoryError;
use crate::models::{
    PriceTier, RowView, Seat, SeatAvailability, SeatHold, SeatMapView, SeatStatus, SeatView,
    SectionView,
};
use crate::store::InventoryStore;

pub struct SeatMapReader<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S> Clone for SeatMapReader<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            clock: self.clock.clone(),
        }
    }
}

impl<S: InventoryStore> SeatMapReader<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn seat_map(
        &self,
        instance_id: i64,
        viewer_session: Option<&str>,
    ) -> Result<SeatMapView, InventoryError> {
        let instance = self
            .store
            .instance(instance_id)
            .await?
            .ok_or(InventoryError::InstanceNotFound)?;
        let seats = self.store.seats(instance_id).await?;
        let holds = self.store.holds(instance_id).await?;
        let now = self.clock.now();

        let live_holds: HashMap<&str, &SeatHold> = holds
            .iter()
            .filter(|h| h.is_live(now))
            .map(|h| (h.seat_uid.as_str(), h))
            .collect();
        let seat_rows: HashMap<&str, &Seat> =
            seats.iter().map(|s| (s.seat_uid.as_str(), s)).collect();

        let mut tier_ids: Vec<i64> = seats.iter().filter_map(|s| s.price_tier_id).collect();
        tier_ids.sort_unstable();
        tier_ids.dedup();
        let tiers: HashMap<i64, PriceTier> = self
            .store
            .price_tiers(&tier_ids)
            .await?
            .into_iter()
            .map(|t| (t.id, t))
            .collect();

        let sections = instance
            .snapshot
            .sections
            .iter()
            .map(|section| SectionView {
                name: section.name.clone(),
                color: section.color.clone(),
                seat_color: section.seat_color.clone(),
                x: section.x,
                y: section.y,
                width: section.width,
                height: section.height,
                rotation: section.rotation,
                rows: section
                    .rows
                    .iter()
                    .map(|row| RowView {
                        label: row.label.clone(),
                        seats: row
                            .seats
                            .iter()
                            .filter_map(|geo_seat| {
                                let seat = seat_rows.get(geo_seat.seat_uid.as_str())?;
                                let tier = seat.price_tier_id.and_then(|id| tiers.get(&id));
                                Some(SeatView {
                                    seat_uid: geo_seat.seat_uid.clone(),
                                    label: geo_seat.label.clone(),
                                    x: geo_seat.x,
                                    y: geo_seat.y,
                                    availability: classify(
                                        seat,
                                        live_holds.get(geo_seat.seat_uid.as_str()).copied(),
                                        viewer_session,
                                    ),
                                    price: seat.price_override.or(tier.map(|t| t.price)),
                                    tier_color: tier.and_then(|t| t.color.clone()),
                                    version: seat.version,
                                })
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();

        Ok(SeatMapView {
            event_seating_id: instance_id,
            canvas_w: instance.snapshot.canvas_w,
            canvas_h: instance.snapshot.canvas_h,
            sections,
        })
    }
}

fn classify(
    seat: &Seat,
    live_hold: Option<&SeatHold>,
    viewer_session: Option<&str>,
) -> SeatAvailability {
    match seat.status {
        SeatStatus::Available => SeatAvailability::Available,
        SeatStatus::Held => match live_hold {
            Some(hold) if viewer_session == Some(hold.session_id.as_str()) => {
                SeatAvailability::HeldByMe
            }
            Some(_) => SeatAvailability::HeldByOther,
            // Hold expired but not yet swept: show it free rather than
            // permanently unavailable.
            None => SeatAvailability::Available,
        },
        SeatStatus::Sold => SeatAvailability::Sold,
        SeatStatus::Blocked => SeatAvailability::Blocked,
        SeatStatus::Disabled => SeatAvailability::Disabled,
    }
}
