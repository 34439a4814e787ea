//! Postgres-backed inventory store.
//!
//! Conditional writes are `UPDATE ... WHERE version = $expected` inside a
//! transaction that also mutates the hold ledger; `rows_affected == 0` is
//! re-read to distinguish a lost race from a missing seat.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::error::InventoryError;
use crate::models::{
    DesignSection, DesignStatus, EventSeatingInstance, GeometrySnapshot, InstanceStatus, NewSeat,
    PriceTier, Seat, SeatHold, SeatStatus, SeatingDesign,
};
use crate::store::{HoldGuard, InventoryStore};

#[derive(Clone)]
pub struct PgInventoryStore {
    pool: PgPool,
}

impl PgInventoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A conditional write matched nothing: either the seat is gone or a
    /// concurrent writer advanced its version.
    async fn conflict_or_missing(
        &self,
        instance_id: i64,
        seat_uid: &str,
    ) -> InventoryError {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM seats WHERE event_seating_id = $1 AND seat_uid = $2)",
        )
        .bind(instance_id)
        .bind(seat_uid)
        .fetch_one(&self.pool)
        .await;

        match exists {
            Ok(true) => InventoryError::VersionConflict,
            Ok(false) => InventoryError::SeatNotFound,
            Err(e) => InventoryError::Storage(e),
        }
    }
}

#[derive(sqlx::FromRow)]
struct DesignRecord {
    id: i64,
    venue_id: i64,
    name: String,
    version: i32,
    status: DesignStatus,
    canvas_w: f64,
    canvas_h: f64,
    sections: Json<Vec<DesignSection>>,
}

impl From<DesignRecord> for SeatingDesign {
    fn from(r: DesignRecord) -> Self {
        SeatingDesign {
            id: r.id,
            venue_id: r.venue_id,
            name: r.name,
            version: r.version,
            status: r.status,
            canvas_w: r.canvas_w,
            canvas_h: r.canvas_h,
            sections: r.sections.0,
        }
    }
}

#[derive(sqlx::FromRow)]
struct InstanceRecord {
    id: i64,
    event_id: i64,
    design_id: i64,
    design_version: i32,
    status: InstanceStatus,
    snapshot: Json<GeometrySnapshot>,
    published_at: Option<DateTime<Utc>>,
    archived_at: Option<DateTime<Utc>>,
}

impl From<InstanceRecord> for EventSeatingInstance {
    fn from(r: InstanceRecord) -> Self {
        EventSeatingInstance {
            id: r.id,
            event_id: r.event_id,
            design_id: r.design_id,
            design_version: r.design_version,
            status: r.status,
            snapshot: r.snapshot.0,
            published_at: r.published_at,
            archived_at: r.archived_at,
        }
    }
}

#[async_trait]
impl InventoryStore for PgInventoryStore {
    async fn design(&self, design_id: i64) -> Result<Option<SeatingDesign>, InventoryError> {
        let record = sqlx::query_as::<_, DesignRecord>(
            "SELECT id, venue_id, name, version, status, canvas_w, canvas_h, sections
             FROM seating_designs
             WHERE id = $1",
        )
        .bind(design_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record.map(Into::into))
    }

    async fn insert_instance(
        &self,
        event_id: i64,
        design: &SeatingDesign,
        snapshot: &GeometrySnapshot,
        now: DateTime<Utc>,
    ) -> Result<EventSeatingInstance, InventoryError> {
        let record = sqlx::query_as::<_, InstanceRecord>(
            "INSERT INTO event_seating_instances
                 (event_id, design_id, design_version, status, snapshot, published_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id, event_id, design_id, design_version, status, snapshot,
                       published_at, archived_at",
        )
        .bind(event_id)
        .bind(design.id)
        .bind(design.version)
        .bind(InstanceStatus::Published)
        .bind(Json(snapshot))
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(record.into())
    }

    async fn instance(
        &self,
        instance_id: i64,
    ) -> Result<Option<EventSeatingInstance>, InventoryError> {
        let record = sqlx::query_as::<_, InstanceRecord>(
            "SELECT id, event_id, design_id, design_version, status, snapshot,
                    published_at, archived_at
             FROM event_seating_instances
             WHERE id = $1",
        )
        .bind(instance_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record.map(Into::into))
    }

    async fn insert_seats(
        &self,
        instance_id: i64,
        seats: &[NewSeat],
        now: DateTime<Utc>,
    ) -> Result<u64, InventoryError> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;
        for seat in seats {
            // ON CONFLICT keeps re-runs (and racing initializers) a no-op.
            let result = sqlx::query(
                "INSERT INTO seats
                     (event_seating_id, seat_uid, section_name, row_label, seat_label,
                      status, version, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6, 1, $7)
                 ON CONFLICT (event_seating_id, seat_uid) DO NOTHING",
            )
            .bind(instance_id)
            .bind(&seat.seat_uid)
            .bind(&seat.section_name)
            .bind(&seat.row_label)
            .bind(&seat.seat_label)
            .bind(seat.status)
            .bind(now)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }
        tx.commit().await?;
        Ok(inserted)
    }

    async fn seat(
        &self,
        instance_id: i64,
        seat_uid: &str,
    ) -> Result<Option<Seat>, InventoryError> {
        let seat = sqlx::query_as::<_, Seat>(
            "SELECT id, event_seating_id, seat_uid, section_name, row_label, seat_label,
                    price_tier_id, price_override, status, version, order_ref, updated_at
             FROM seats
             WHERE event_seating_id = $1 AND seat_uid = $2",
        )
        .bind(instance_id)
        .bind(seat_uid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(seat)
    }

    async fn seats(&self, instance_id: i64) -> Result<Vec<Seat>, InventoryError> {
        let seats = sqlx::query_as::<_, Seat>(
            "SELECT id, event_seating_id, seat_uid, section_name, row_label, seat_label,
                    price_tier_id, price_override, status, version, order_ref, updated_at
             FROM seats
             WHERE event_seating_id = $1
             ORDER BY section_name, row_label, seat_label",
        )
        .bind(instance_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(seats)
    }

    async fn hold_for_seat(
        &self,
        instance_id: i64,
        seat_uid: &str,
    ) -> Result<Option<SeatHold>, InventoryError> {
        let hold = sqlx::query_as::<_, SeatHold>(
            "SELECT id, event_seating_id, seat_uid, session_id, expires_at, created_at
             FROM seat_holds
             WHERE event_seating_id = $1 AND seat_uid = $2",
        )
        .bind(instance_id)
        .bind(seat_uid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(hold)
    }

    async fn holds(&self, instance_id: i64) -> Result<Vec<SeatHold>, InventoryError> {
        let holds = sqlx::query_as::<_, SeatHold>(
            "SELECT id, event_seating_id, seat_uid, session_id, expires_at, created_at
             FROM seat_holds
             WHERE event_seating_id = $1",
        )
        .bind(instance_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(holds)
    }

    async fn expired_holds(
        &self,
        instance_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<SeatHold>, InventoryError> {
        let holds = sqlx::query_as::<_, SeatHold>(
            "SELECT id, event_seating_id, seat_uid, session_id, expires_at, created_at
             FROM seat_holds
             WHERE event_seating_id = $1 AND expires_at <= $2",
        )
        .bind(instance_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(holds)
    }

    async fn instances_with_expired_holds(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<i64>, InventoryError> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT DISTINCT event_seating_id FROM seat_holds WHERE expires_at <= $1",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
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
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE seats
             SET status = $1, version = version + 1, updated_at = $2
             WHERE event_seating_id = $3 AND seat_uid = $4 AND version = $5",
        )
        .bind(SeatStatus::Held)
        .bind(now)
        .bind(instance_id)
        .bind(seat_uid)
        .bind(expected_version)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            tx.rollback().await?;
            return Err(self.conflict_or_missing(instance_id, seat_uid).await);
        }

        let insert = sqlx::query(
            "INSERT INTO seat_holds
                 (id, event_seating_id, seat_uid, session_id, expires_at, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(Uuid::new_v4())
        .bind(instance_id)
        .bind(seat_uid)
        .bind(session_id)
        .bind(expires_at)
        .bind(now)
        .execute(&mut *tx)
        .await;

        if let Err(e) = insert {
            tx.rollback().await?;
            // Unique (event_seating_id, seat_uid) means a hold row survived a
            // race; the caller sees it as any other lost write.
            let unique = e
                .as_database_error()
                .map(|d| d.kind() == sqlx::error::ErrorKind::UniqueViolation)
                .unwrap_or(false);
            return Err(if unique {
                InventoryError::VersionConflict
            } else {
                InventoryError::Storage(e)
            });
        }

        tx.commit().await?;
        Ok(expected_version + 1)
    }

    async fn clear_hold(
        &self,
        instance_id: i64,
        seat_uid: &str,
        expected_version: i32,
        guard: HoldGuard<'_>,
        now: DateTime<Utc>,
    ) -> Result<i32, InventoryError> {
        let mut tx = self.pool.begin().await?;

        let deleted = match guard {
            HoldGuard::Owner(session_id) => {
                sqlx::query(
                    "DELETE FROM seat_holds
                     WHERE event_seating_id = $1 AND seat_uid = $2 AND session_id = $3",
                )
                .bind(instance_id)
                .bind(seat_uid)
                .bind(session_id)
            }
            HoldGuard::Expired => {
                sqlx::query(
                    "DELETE FROM seat_holds
                     WHERE event_seating_id = $1 AND seat_uid = $2 AND expires_at <= $3",
                )
                .bind(instance_id)
                .bind(seat_uid)
                .bind(now)
            }
        }
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if deleted == 0 {
            tx.rollback().await?;
            return Err(InventoryError::VersionConflict);
        }

        let updated = sqlx::query(
            "UPDATE seats
             SET status = $1, version = version + 1, updated_at = $2
             WHERE event_seating_id = $3 AND seat_uid = $4 AND version = $5",
        )
        .bind(SeatStatus::Available)
        .bind(now)
        .bind(instance_id)
        .bind(seat_uid)
        .bind(expected_version)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            tx.rollback().await?;
            return Err(self.conflict_or_missing(instance_id, seat_uid).await);
        }

        tx.commit().await?;
        Ok(expected_version + 1)
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
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query(
            "DELETE FROM seat_holds
             WHERE event_seating_id = $1 AND seat_uid = $2 AND session_id = $3",
        )
        .bind(instance_id)
        .bind(seat_uid)
        .bind(session_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if deleted == 0 {
            tx.rollback().await?;
            return Err(InventoryError::VersionConflict);
        }

        let updated = sqlx::query(
            "UPDATE seats
             SET status = $1, order_ref = $2, version = version + 1, updated_at = $3
             WHERE event_seating_id = $4 AND seat_uid = $5 AND version = $6",
        )
        .bind(SeatStatus::Sold)
        .bind(order_ref)
        .bind(now)
        .bind(instance_id)
        .bind(seat_uid)
        .bind(expected_version)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            tx.rollback().await?;
            return Err(self.conflict_or_missing(instance_id, seat_uid).await);
        }

        tx.commit().await?;
        Ok(expected_version + 1)
    }

    async fn extend_hold(
        &self,
        hold_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, InventoryError> {
        let updated = sqlx::query("UPDATE seat_holds SET expires_at = $1 WHERE id = $2")
            .bind(expires_at)
            .bind(hold_id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(updated > 0)
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
        let updated = sqlx::query(
            "UPDATE seats
             SET status = $1, version = version + 1, updated_at = $2
             WHERE event_seating_id = $3 AND seat_uid = $4 AND version = $5 AND status = $6",
        )
        .bind(to)
        .bind(now)
        .bind(instance_id)
        .bind(seat_uid)
        .bind(expected_version)
        .bind(from)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(self.conflict_or_missing(instance_id, seat_uid).await);
        }
        Ok(expected_version + 1)
    }

    async fn price_tiers(&self, ids: &[i64]) -> Result<Vec<PriceTier>, InventoryError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let tiers = sqlx::query_as::<_, PriceTier>(
            "SELECT id, code, name, price, color FROM price_tiers WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(tiers)
    }
}
