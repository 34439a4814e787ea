//! Durable inventory access.
//!
//! [`InventoryStore`] is the only surface that touches seat and hold rows.
//! Status-affecting writes are compare-and-set on the seat's version column:
//! the caller reads a seat, decides the transition, and submits it gated on
//! the version it saw. A lost race comes back as
//! [`InventoryError::VersionConflict`] and the caller retries on fresh state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::InventoryError;
use crate::models::{
    EventSeatingInstance, GeometrySnapshot, NewSeat, PriceTier, Seat, SeatHold, SeatStatus,
    SeatingDesign,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryInventoryStore;
pub use postgres::PgInventoryStore;

/// Condition the seat's hold row must satisfy for a clearing write to land.
/// Guards the race between hold expiry detection and a concurrent `extend`
/// or `confirm`, which may move the hold without touching the seat version.
#[derive(Debug, Clone, Copy)]
pub enum HoldGuard<'a> {
    /// The hold still belongs to this session.
    Owner(&'a str),
    /// The hold is still expired at the supplied instant.
    Expired,
}

#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn design(&self, design_id: i64) -> Result<Option<SeatingDesign>, InventoryError>;

    async fn insert_instance(
        &self,
        event_id: i64,
        design: &SeatingDesign,
        snapshot: &GeometrySnapshot,
        now: DateTime<Utc>,
    ) -> Result<EventSeatingInstance, InventoryError>;

    async fn instance(&self, instance_id: i64)
        -> Result<Option<EventSeatingInstance>, InventoryError>;

    /// Bulk-insert seat rows, skipping any (instance, seat_uid) that already
    /// exists. Returns the number actually inserted, which makes repeated
    /// initialization a no-op returning 0.
    async fn insert_seats(
        &self,
        instance_id: i64,
        seats: &[NewSeat],
        now: DateTime<Utc>,
    ) -> Result<u64, InventoryError>;

    async fn seat(
        &self,
        instance_id: i64,
        seat_uid: &str,
    ) -> Result<Option<Seat>, InventoryError>;

    async fn seats(&self, instance_id: i64) -> Result<Vec<Seat>, InventoryError>;

    async fn hold_for_seat(
        &self,
        instance_id: i64,
        seat_uid: &str,
    ) -> Result<Option<SeatHold>, InventoryError>;

    async fn holds(&self, instance_id: i64) -> Result<Vec<SeatHold>, InventoryError>;

    async fn expired_holds(
        &self,
        instance_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<SeatHold>, InventoryError>;

    /// Instances that currently have at least one expired hold; the sweep
    /// visits only these.
    async fn instances_with_expired_holds(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<i64>, InventoryError>;

    /// available -> held, atomically with hold creation. Returns the new
    /// seat version.
    async fn place_hold(
        &self,
        instance_id: i64,
        seat_uid: &str,
        expected_version: i32,
        session_id: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<i32, InventoryError>;

    /// held -> available, atomically with hold deletion under `guard`.
    /// Returns the new seat version.
    async fn clear_hold(
        &self,
        instance_id: i64,
        seat_uid: &str,
        expected_version: i32,
        guard: HoldGuard<'_>,
        now: DateTime<Utc>,
    ) -> Result<i32, InventoryError>;

    /// held -> sold, atomically consuming the session's hold and recording
    /// the order reference. Returns the new seat version.
    async fn mark_sold(
        &self,
        instance_id: i64,
        seat_uid: &str,
        expected_version: i32,
        session_id: &str,
        order_ref: &str,
        now: DateTime<Utc>,
    ) -> Result<i32, InventoryError>;

    /// Push a hold's expiry forward. Not a status transition: the seat
    /// version is untouched. Returns false when the hold no longer exists.
    async fn extend_hold(
        &self,
        hold_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, InventoryError>;

    /// Version-gated `from` -> `to` for transitions that carry no hold
    /// (operator block/unblock). Returns the new seat version.
    async fn set_seat_status(
        &self,
        instance_id: i64,
        seat_uid: &str,
        expected_version: i32,
        from: SeatStatus,
        to: SeatStatus,
        now: DateTime<Utc>,
    ) -> Result<i32, InventoryError>;

    async fn price_tiers(&self, ids: &[i64]) -> Result<Vec<PriceTier>, InventoryError>;
}
