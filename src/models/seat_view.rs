use serde::{Deserialize, Serialize};

/// Client-facing availability classification. `HeldByMe` vs `HeldByOther` is
/// computed against the viewer's own session at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatAvailability {
    Available,
    HeldByMe,
    HeldByOther,
    Sold,
    Blocked,
    Disabled,
}

/// Seat map read model, shaped for direct serialization to a polling client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatMapView {
    pub event_seating_id: i64,
    pub canvas_w: f64,
    pub canvas_h: f64,
    pub sections: Vec<SectionView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionView {
    pub name: String,
    pub color: Option<String>,
    pub seat_color: Option<String>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
    pub rows: Vec<RowView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowView {
    pub label: String,
    pub seats: Vec<SeatView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatView {
    pub seat_uid: String,
    pub label: String,
    pub x: f64,
    pub y: f64,
    pub availability: SeatAvailability,
    pub price: Option<f64>,
    pub tier_color: Option<String>,
    /// Lets polling clients detect stale reads against per-seat writes.
    pub version: i32,
}
