use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One physical seat instance for one event seating instance. Created in bulk
/// from the geometry snapshot, mutated only through the inventory coordinator.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Seat {
    pub id: i64,
    pub event_seating_id: i64,
    pub seat_uid: String,
    pub section_name: String,
    pub row_label: String,
    pub seat_label: String,
    pub price_tier_id: Option<i64>,
    pub price_override: Option<f64>,
    pub status: SeatStatus,
    /// Monotonic; +1 on every status-affecting write. All conditional writes
    /// are gated on it.
    pub version: i32,
    pub order_ref: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "seat_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SeatStatus {
    Available,
    Held,
    Sold,
    /// Operator-blocked; available <-> blocked only.
    Blocked,
    /// Unsellable by design (marked in the layout); terminal.
    Disabled,
}

/// Seat row about to be inserted during inventory initialization.
#[derive(Debug, Clone)]
pub struct NewSeat {
    pub seat_uid: String,
    pub section_name: String,
    pub row_label: String,
    pub seat_label: String,
    pub status: SeatStatus,
}
