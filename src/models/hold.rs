use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Time-bounded exclusive claim on one seat by one checkout session.
/// At most one live hold exists per seat; a hold only means anything while
/// its seat's status is `held`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SeatHold {
    pub id: Uuid,
    pub event_seating_id: i64,
    pub seat_uid: String,
    /// Opaque identity supplied by the checkout layer.
    pub session_id: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl SeatHold {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}
