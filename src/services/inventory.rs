//! Inventory coordinator: the seat state machine.
//!
//! The only component allowed to change seat status. Every transition is a
//! read followed by a version-gated write against the store, so concurrent
//! checkout traffic resolves each seat race to exactly one winner without
//! long-held locks. Operations take and return plain data; the same calls
//! serve the HTTP layer, the reclaim sweep, and the test harness.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::error::InventoryError;
use crate::geometry;
use crate::models::{EventSeatingInstance, NewSeat, Seat, SeatStatus};
use crate::store::{HoldGuard, InventoryStore};

/// Outcome of a successful hold or extend, shaped for the checkout client.
#[derive(Debug, Clone, Serialize)]
pub struct HoldReceipt {
    pub seat_uid: String,
    pub version: i32,
    pub expires_at: DateTime<Utc>,
}

pub struct InventoryCoordinator<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S> Clone for InventoryCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            clock: self.clock.clone(),
        }
    }
}

impl<S: InventoryStore> InventoryCoordinator<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Attach a design to an event: freeze its geometry and create the
    /// instance the event will sell against. Operator action.
    pub async fn create_instance(
        &self,
        event_id: i64,
        design_id: i64,
    ) -> Result<EventSeatingInstance, InventoryError> {
        let design = self
            .store
            .design(design_id)
            .await?
            .ok_or_else(|| InventoryError::InvalidDesign(format!("design {design_id} not found")))?;
        let snapshot = geometry::snapshot(&design)?;
        let instance = self
            .store
            .insert_instance(event_id, &design, &snapshot, self.clock.now())
            .await?;
        info!(
            instance_id = instance.id,
            event_id,
            design_id,
            design_version = design.version,
            seats = snapshot.seat_count(),
            "created event seating instance"
        );
        Ok(instance)
    }

    /// Populate the seat inventory from the instance's frozen snapshot.
    /// Safe under at-least-once invocation: a second run inserts nothing and
    /// returns 0.
    pub async fn initialize_seats(&self, instance_id: i64) -> Result<u64, InventoryError> {
        let instance = self
            .store
            .instance(instance_id)
            .await?
            .ok_or(InventoryError::InstanceNotFound)?;
        if instance.snapshot.seat_count() == 0 {
            return Err(InventoryError::EmptyGeometry);
        }

        let new_seats: Vec<NewSeat> = instance
            .snapshot
            .seats()
            .map(|(section, row, seat)| NewSeat {
                seat_uid: seat.seat_uid.clone(),
                section_name: section.name.clone(),
                row_label: row.label.clone(),
                seat_label: seat.label.clone(),
                status: if seat.unavailable {
                    SeatStatus::Disabled
                } else {
                    SeatStatus::Available
                },
            })
            .collect();

        let inserted = self
            .store
            .insert_seats(instance_id, &new_seats, self.clock.now())
            .await?;
        info!(instance_id, inserted, "initialized seat inventory");
        Ok(inserted)
    }

    /// Claim exclusive access to one seat for `ttl`. An expired hold left by
    /// another session is reclaimed inline before the new hold is placed.
    pub async fn hold(
        &self,
        instance_id: i64,
        seat_uid: &str,
        session_id: &str,
        ttl: Duration,
    ) -> Result<HoldReceipt, InventoryError> {
        let now = self.clock.now();
        let seat = self.require_seat(instance_id, seat_uid).await?;

        match seat.status {
            SeatStatus::Available => {
                let version = self
                    .store
                    .place_hold(instance_id, seat_uid, seat.version, session_id, now + ttl, now)
                    .await?;
                Ok(HoldReceipt {
                    seat_uid: seat_uid.to_string(),
                    version,
                    expires_at: now + ttl,
                })
            }
            SeatStatus::Held => {
                let hold = self.store.hold_for_seat(instance_id, seat_uid).await?;
                match hold {
                    Some(hold) if hold.session_id == session_id && hold.is_live(now) => {
                        // Client retried its own hold; behaves like extend.
                        self.store.extend_hold(hold.id, now + ttl).await?;
                        Ok(HoldReceipt {
                            seat_uid: seat_uid.to_string(),
                            version: seat.version,
                            expires_at: now + ttl,
                        })
                    }
                    Some(hold) if hold.is_live(now) => Err(InventoryError::SeatUnavailable),
                    Some(_) => {
                        // Expired: reclaim inline, then claim on the fresh version.
                        let reclaimed_version = self
                            .store
                            .clear_hold(
                                instance_id,
                                seat_uid,
                                seat.version,
                                HoldGuard::Expired,
                                now,
                            )
                            .await?;
                        let version = self
                            .store
                            .place_hold(
                                instance_id,
                                seat_uid,
                                reclaimed_version,
                                session_id,
                                now + ttl,
                                now,
                            )
                            .await?;
                        Ok(HoldReceipt {
                            seat_uid: seat_uid.to_string(),
                            version,
                            expires_at: now + ttl,
                        })
                    }
                    None => Err(InventoryError::SeatUnavailable),
                }
            }
            SeatStatus::Sold | SeatStatus::Blocked | SeatStatus::Disabled => {
                Err(InventoryError::SeatUnavailable)
            }
        }
    }

    /// All-or-nothing multi-seat hold. On the first failure every hold
    /// acquired so far is released and the failure is returned.
    pub async fn hold_many(
        &self,
        instance_id: i64,
        seat_uids: &[String],
        session_id: &str,
        ttl: Duration,
    ) -> Result<Vec<HoldReceipt>, InventoryError> {
        let mut acquired: Vec<HoldReceipt> = Vec::with_capacity(seat_uids.len());
        for seat_uid in seat_uids {
            match self.hold(instance_id, seat_uid, session_id, ttl).await {
                Ok(receipt) => acquired.push(receipt),
                Err(e) => {
                    for receipt in &acquired {
                        if let Err(release_err) = self
                            .release(instance_id, &receipt.seat_uid, session_id)
                            .await
                        {
                            warn!(
                                instance_id,
                                seat_uid = %receipt.seat_uid,
                                error = %release_err,
                                "failed to roll back partial hold"
                            );
                        }
                    }
                    return Err(e);
                }
            }
        }
        Ok(acquired)
    }

    /// Push a live hold's expiry forward. Not a status transition: the seat
    /// version does not move.
    pub async fn extend(
        &self,
        instance_id: i64,
        seat_uid: &str,
        session_id: &str,
        ttl: Duration,
    ) -> Result<DateTime<Utc>, InventoryError> {
        let now = self.clock.now();
        let seat = self.require_seat(instance_id, seat_uid).await?;
        if seat.status != SeatStatus::Held {
            return Err(InventoryError::HoldNotOwned);
        }
        let hold = self
            .store
            .hold_for_seat(instance_id, seat_uid)
            .await?
            .ok_or(InventoryError::HoldNotOwned)?;
        if hold.session_id != session_id {
            return Err(InventoryError::HoldNotOwned);
        }
        if !hold.is_live(now) {
            return Err(InventoryError::HoldExpired);
        }
        let expires_at = now + ttl;
        if !self.store.extend_hold(hold.id, expires_at).await? {
            // Deleted between read and write; the sweep got there first.
            return Err(InventoryError::HoldExpired);
        }
        Ok(expires_at)
    }

    /// Give the seat back. Idempotent for the owning session: releasing a
    /// seat it no longer holds is a no-op success, so duplicate client
    /// retries are harmless. Fails only when a different session currently
    /// owns a live hold.
    pub async fn release(
        &self,
        instance_id: i64,
        seat_uid: &str,
        session_id: &str,
    ) -> Result<(), InventoryError> {
        let now = self.clock.now();
        let seat = self.require_seat(instance_id, seat_uid).await?;
        if seat.status != SeatStatus::Held {
            return Ok(());
        }
        let hold = match self.store.hold_for_seat(instance_id, seat_uid).await? {
            Some(hold) => hold,
            None => return Ok(()),
        };
        if hold.session_id != session_id {
            if hold.is_live(now) {
                return Err(InventoryError::HoldNotOwned);
            }
            // Someone else's expired hold; leave it to the sweep.
            return Ok(());
        }
        match self
            .store
            .clear_hold(
                instance_id,
                seat_uid,
                seat.version,
                HoldGuard::Owner(session_id),
                now,
            )
            .await
        {
            Ok(_) => Ok(()),
            // Lost a race with our own retry or the sweep; the seat is free
            // either way.
            Err(InventoryError::VersionConflict) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Consume the session's hold and mark the seat sold under `order_ref`.
    /// Idempotent on the order reference: a repeated confirm with the same
    /// reference succeeds against the already-sold seat.
    pub async fn confirm(
        &self,
        instance_id: i64,
        seat_uid: &str,
        session_id: &str,
        order_ref: &str,
    ) -> Result<i32, InventoryError> {
        let now = self.clock.now();
        let seat = self.require_seat(instance_id, seat_uid).await?;

        match seat.status {
            SeatStatus::Sold => {
                if seat.order_ref.as_deref() == Some(order_ref) {
                    Ok(seat.version)
                } else {
                    Err(InventoryError::SeatAlreadySold)
                }
            }
            SeatStatus::Held => {
                let hold = self
                    .store
                    .hold_for_seat(instance_id, seat_uid)
                    .await?
                    .ok_or(InventoryError::HoldNotOwned)?;
                if hold.session_id != session_id {
                    return Err(InventoryError::HoldNotOwned);
                }
                if !hold.is_live(now) {
                    return Err(InventoryError::HoldExpired);
                }
                self.store
                    .mark_sold(instance_id, seat_uid, seat.version, session_id, order_ref, now)
                    .await
            }
            _ => Err(InventoryError::HoldNotOwned),
        }
    }

    /// Free every seat whose hold has expired. Each reclaim is gated on the
    /// seat version and on the hold still being expired, so a concurrent
    /// confirm or extend wins the race cleanly. A single seat's conflict is
    /// logged and skipped, never aborts the sweep.
    pub async fn reclaim_expired(&self, instance_id: i64) -> Result<u64, InventoryError> {
        let now = self.clock.now();
        let expired = self.store.expired_holds(instance_id, now).await?;
        let mut reclaimed = 0u64;

        for hold in expired {
            let seat = match self.store.seat(instance_id, &hold.seat_uid).await? {
                Some(seat) => seat,
                None => continue,
            };
            if seat.status != SeatStatus::Held {
                continue;
            }
            match self
                .store
                .clear_hold(
                    instance_id,
                    &hold.seat_uid,
                    seat.version,
                    HoldGuard::Expired,
                    now,
                )
                .await
            {
                Ok(_) => reclaimed += 1,
                Err(InventoryError::VersionConflict) | Err(InventoryError::SeatNotFound) => {
                    warn!(
                        instance_id,
                        seat_uid = %hold.seat_uid,
                        "skipping reclaim, seat changed concurrently"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        if reclaimed > 0 {
            info!(instance_id, reclaimed, "reclaimed expired holds");
        }
        Ok(reclaimed)
    }

    /// Operator block: available -> blocked for each named seat. Seats in
    /// any other state are skipped. Returns the number blocked.
    pub async fn block_seats(
        &self,
        instance_id: i64,
        seat_uids: &[String],
    ) -> Result<u64, InventoryError> {
        self.flip_status(instance_id, seat_uids, SeatStatus::Available, SeatStatus::Blocked)
            .await
    }

    /// Operator unblock: blocked -> available.
    pub async fn unblock_seats(
        &self,
        instance_id: i64,
        seat_uids: &[String],
    ) -> Result<u64, InventoryError> {
        self.flip_status(instance_id, seat_uids, SeatStatus::Blocked, SeatStatus::Available)
            .await
    }

    async fn flip_status(
        &self,
        instance_id: i64,
        seat_uids: &[String],
        from: SeatStatus,
        to: SeatStatus,
    ) -> Result<u64, InventoryError> {
        let now = self.clock.now();
        let mut changed = 0u64;
        for seat_uid in seat_uids {
            let seat = match self.store.seat(instance_id, seat_uid).await? {
                Some(seat) => seat,
                None => continue,
            };
            if seat.status != from {
                continue;
            }
            match self
                .store
                .set_seat_status(instance_id, seat_uid, seat.version, from, to, now)
                .await
            {
                Ok(_) => changed += 1,
                Err(InventoryError::VersionConflict) | Err(InventoryError::SeatNotFound) => {
                    warn!(instance_id, seat_uid = %seat_uid, "skipping status flip, seat changed");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(changed)
    }

    async fn require_seat(
        &self,
        instance_id: i64,
        seat_uid: &str,
    ) -> Result<Seat, InventoryError> {
        self.store
            .seat(instance_id, seat_uid)
            .await?
            .ok_or(InventoryError::SeatNotFound)
    }
}
