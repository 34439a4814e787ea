//! In-memory store for tests and harness use.
//!
//! Applies the same version discipline as the Postgres store so the
//! coordinator behaves identically against either backend.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::InventoryError;
use crate::models::{
    EventSeatingInstance, GeometrySnapshot, InstanceStatus, NewSeat, PriceTier, Seat, SeatHold,
    SeatStatus, SeatingDesign,
};
use crate::store::{HoldGuard, InventoryStore};

#[derive(Default)]
struct State {
    designs: BTreeMap<i64, SeatingDesign>,
    instances: BTreeMap<i64, EventSeatingInstance>,
    seats: BTreeMap<(i64, String), Seat>,
    holds: BTreeMap<(i64, String), SeatHold>,
    tiers: BTreeMap<i64, PriceTier>,
    next_instance_id: i64,
    next_seat_id: i64,
}

#[derive(Default)]
pub struct MemoryInventoryStore {
    state: Mutex<State>,
}

impl MemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a design, standing in for the design-authoring surface.
    pub fn add_design(&self, design: SeatingDesign) {
        let mut state = self.state.lock().unwrap();
        state.designs.insert(design.id, design);
    }

    /// Seed a price tier, standing in for tier management.
    pub fn add_price_tier(&self, tier: PriceTier) {
        let mut state = self.state.lock().unwrap();
        state.tiers.insert(tier.id, tier);
    }

    /// Assign a tier to a seat, standing in for the pricing surface.
    pub fn assign_price_tier(&self, instance_id: i64, seat_uid: &str, tier_id: i64) {
        let mut state = self.state.lock().unwrap();
        if let Some(seat) = state.seats.get_mut(&(instance_id, seat_uid.to_string())) {
            seat.price_tier_id = Some(tier_id);
        }
    }
}

impl State {
    fn checked_seat(
        &mut self,
        instance_id: i64,
        seat_uid: &str,
        expected_version: i32,
    ) -> Result<&mut Seat, InventoryError> {
        let seat = self
            .seats
            .get_mut(&(instance_id, seat_uid.to_string()))
            .ok_or(InventoryError::SeatNotFound)?;
        if seat.version != expected_version {
            return Err(InventoryError::VersionConflict);
        }
        Ok(seat)
    }
}

#[async_trait]
impl InventoryStore for MemoryInventoryStore {
    async fn design(&self, design_id: i64) -> Result<Option<SeatingDesign>, InventoryError> {
        let state = self.state.lock().unwrap();
        Ok(state.designs.get(&design_id).cloned())
    }

    async fn insert_instance(
        &self,
        event_id: i64,
        design: &SeatingDesign,
        snapshot: &GeometrySnapshot,
        now: DateTime<Utc>,
    ) -> Result<EventSeatingInstance, InventoryError> {
        let mut state = self.state.lock().unwrap();
        state.next_instance_id += 1;
        let instance = EventSeatingInstance {
            id: state.next_instance_id,
            event_id,
            design_id: design.id,
            design_version: design.version,
            status: InstanceStatus::Published,
            snapshot: snapshot.clone(),
            published_at: Some(now),
            archived_at: None,
        };
        state.instances.insert(instance.id, instance.clone());
        Ok(instance)
    }

    async fn instance(
        &self,
        instance_id: i64,
    ) -> Result<Option<EventSeatingInstance>, InventoryError> {
        let state = self.state.lock().unwrap();
        Ok(state.instances.get(&instance_id).cloned())
    }

    async fn insert_seats(
        &self,
        instance_id: i64,
        seats: &[NewSeat],
        now: DateTime<Utc>,
    ) -> Result<u64, InventoryError> {
        let mut state = self.state.lock().unwrap();
        let mut inserted = 0;
        for new_seat in seats {
            let key = (instance_id, new_seat.seat_uid.clone());
            if state.seats.contains_key(&key) {
                continue;
            }
            state.next_seat_id += 1;
            let seat = Seat {
                id: state.next_seat_id,
                event_seating_id: instance_id,
                seat_uid: new_seat.seat_uid.clone(),
                section_name: new_seat.section_name.clone(),
                row_label: new_seat.row_label.clone(),
                seat_label: new_seat.seat_label.clone(),
                price_tier_id: None,
                price_override: None,
                status: new_seat.status,
                version: 1,
                order_ref: None,
                updated_at: now,
            };
            state.seats.insert(key, seat);
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn seat(
        &self,
        instance_id: i64,
        seat_uid: &str,
    ) -> Result<Option<Seat>, InventoryError> {
        let state = self.state.lock().unwrap();
        Ok(state.seats.get(&(instance_id, seat_uid.to_string())).cloned())
    }

    async fn seats(&self, instance_id: i64) -> Result<Vec<Seat>, InventoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .seats
            .values()
            .filter(|s| s.event_seating_id == instance_id)
            .cloned()
            .collect())
    }

    async fn hold_for_seat(
        &self,
        instance_id: i64,
        seat_uid: &str,
    ) -> Result<Option<SeatHold>, InventoryError> {
        let state = self.state.lock().unwrap();
        Ok(state.holds.get(&(instance_id, seat_uid.to_string())).cloned())
    }

    async fn holds(&self, instance_id: i64) -> Result<Vec<SeatHold>, InventoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .holds
            .values()
            .filter(|h| h.event_seating_id == instance_id)
            .cloned()
            .collect())
    }

    async fn expired_holds(
        &self,
        instance_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<SeatHold>, InventoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .holds
            .values()
            .filter(|h| h.event_seating_id == instance_id && h.expires_at <= now)
            .cloned()
            .collect())
    }

    async fn instances_with_expired_holds(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<i64>, InventoryError> {
        let state = self.state.lock().unwrap();
        let mut ids: Vec<i64> = state
            .holds
            .values()
            .filter(|h| h.expires_at <= now)
            .map(|h| h.event_seating_id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }

    async fn place_hold(
        &self,
        instance_id: i64,
        seat_uid: &str,
        expected_version: i32,
        session_id: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<i32, InventoryError> {
        let mut state = self.state.lock().unwrap();
        let key = (instance_id, seat_uid.to_string());
        if state.holds.contains_key(&key) {
            return Err(InventoryError::VersionConflict);
        }
        let seat = state.checked_seat(instance_id, seat_uid, expected_version)?;
        seat.status = SeatStatus::Held;
        seat.version += 1;
        seat.updated_at = now;
        let version = seat.version;
        state.holds.insert(
            key,
            SeatHold {
                id: Uuid::new_v4(),
                event_seating_id: instance_id,
                seat_uid: seat_uid.to_string(),
                session_id: session_id.to_string(),
                expires_at,
                created_at: now,
            },
        );
        Ok(version)
    }

    async fn clear_hold(
        &self,
        instance_id: i64,
        seat_uid: &str,
        expected_version: i32,
        guard: HoldGuard<'_>,
        now: DateTime<Utc>,
    ) -> Result<i32, InventoryError> {
        let mut state = self.state.lock().unwrap();
        let key = (instance_id, seat_uid.to_string());
        let passes = match (&guard, state.holds.get(&key)) {
            (HoldGuard::Owner(session), Some(hold)) => hold.session_id == *session,
            (HoldGuard::Expired, Some(hold)) => hold.expires_at <= now,
            (_, None) => false,
        };
        if !passes {
            return Err(InventoryError::VersionConflict);
        }
        let seat = state.checked_seat(instance_id, seat_uid, expected_version)?;
        seat.status = SeatStatus::Available;
        seat.version += 1;
        seat.updated_at = now;
        let version = seat.version;
        state.holds.remove(&key);
        Ok(version)
    }

    async fn mark_sold(
        &self,
        instance_id: i64,
        seat_uid: &str,
        expected_version: i32,
        session_id: &str,
        order_ref: &str,
        now: DateTime<Utc>,
    ) -> Result<i32, InventoryError> {
        let mut state = self.state.lock().unwrap();
        let key = (instance_id, seat_uid.to_string());
        match state.holds.get(&key) {
            Some(hold) if hold.session_id == session_id => {}
            _ => return Err(InventoryError::VersionConflict),
        }
        let seat = state.checked_seat(instance_id, seat_uid, expected_version)?;
        seat.status = SeatStatus::Sold;
        seat.version += 1;
        seat.updated_at = now;
        seat.order_ref = Some(order_ref.to_string());
        let version = seat.version;
        state.holds.remove(&key);
        Ok(version)
    }

    async fn extend_hold(
        &self,
        hold_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, InventoryError> {
        let mut state = self.state.lock().unwrap();
        for hold in state.holds.values_mut() {
            if hold.id == hold_id {
                hold.expires_at = expires_at;
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn set_seat_status(
        &self,
        instance_id: i64,
        seat_uid: &str,
        expected_version: i32,
        from: SeatStatus,
        to: SeatStatus,
        now: DateTime<Utc>,
    ) -> Result<i32, InventoryError> {
        let mut state = self.state.lock().unwrap();
        let seat = state.checked_seat(instance_id, seat_uid, expected_version)?;
        if seat.status != from {
            return Err(InventoryError::VersionConflict);
        }
        seat.status = to;
        seat.version += 1;
        seat.updated_at = now;
        Ok(seat.version)
    }

    async fn price_tiers(&self, ids: &[i64]) -> Result<Vec<PriceTier>, InventoryError> {
        let state = self.state.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| state.tiers.get(id).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    async fn store_with_seat() -> MemoryInventoryStore {
        let store = MemoryInventoryStore::new();
        store
            .insert_seats(
                1,
                &[NewSeat {
                    seat_uid: "A1".to_string(),
                    section_name: "S".to_string(),
                    row_label: "A".to_string(),
                    seat_label: "1".to_string(),
                    status: SeatStatus::Available,
                }],
                now(),
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn place_hold_is_version_gated() {
        let store = store_with_seat().await;
        let expiry = now() + Duration::seconds(60);

        let err = store
            .place_hold(1, "A1", 99, "s1", expiry, now())
            .await
            .unwrap_err();
        assert!(matches!(err, InventoryError::VersionConflict));

        let version = store.place_hold(1, "A1", 1, "s1", expiry, now()).await.unwrap();
        assert_eq!(version, 2);

        // hold row already present: any further claim loses
        let err = store
            .place_hold(1, "A1", 2, "s2", expiry, now())
            .await
            .unwrap_err();
        assert!(matches!(err, InventoryError::VersionConflict));
    }

    #[tokio::test]
    async fn expired_guard_refuses_live_holds() {
        let store = store_with_seat().await;
        let expiry = now() + Duration::seconds(60);
        store.place_hold(1, "A1", 1, "s1", expiry, now()).await.unwrap();

        // The extend race: the hold looked expired to a stale reader but is
        // live again; the clearing write must not land.
        let err = store
            .clear_hold(1, "A1", 2, HoldGuard::Expired, now())
            .await
            .unwrap_err();
        assert!(matches!(err, InventoryError::VersionConflict));

        let later = now() + Duration::seconds(61);
        let version = store
            .clear_hold(1, "A1", 2, HoldGuard::Expired, later)
            .await
            .unwrap();
        assert_eq!(version, 3);
        assert!(store.hold_for_seat(1, "A1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn owner_guard_refuses_other_sessions() {
        let store = store_with_seat().await;
        let expiry = now() + Duration::seconds(60);
        store.place_hold(1, "A1", 1, "s1", expiry, now()).await.unwrap();

        let err = store
            .clear_hold(1, "A1", 2, HoldGuard::Owner("s2"), now())
            .await
            .unwrap_err();
        assert!(matches!(err, InventoryError::VersionConflict));

        store
            .clear_hold(1, "A1", 2, HoldGuard::Owner("s1"), now())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn extend_of_missing_hold_reports_gone() {
        let store = store_with_seat().await;
        let extended = store
            .extend_hold(Uuid::new_v4(), now() + Duration::seconds(60))
            .await
            .unwrap();
        assert!(!extended);
    }

    #[tokio::test]
    async fn missing_seat_is_distinguished_from_lost_race() {
        let store = store_with_seat().await;
        let err = store
            .place_hold(1, "Z9", 1, "s1", now() + Duration::seconds(60), now())
            .await
            .unwrap_err();
        assert!(matches!(err, InventoryError::SeatNotFound));
    }
}
