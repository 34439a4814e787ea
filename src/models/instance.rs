use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::GeometrySnapshot;

/// Binds one seating design, at a specific version, to one event.
/// The snapshot is frozen at creation; edits to the underlying design never
/// propagate here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSeatingInstance {
    pub id: i64,
    pub event_id: i64,
    pub design_id: i64,
    pub design_version: i32,
    pub status: InstanceStatus,
    pub snapshot: GeometrySnapshot,
    pub published_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "instance_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InstanceStatus {
    Draft,
    Published,
    Archived,
}
