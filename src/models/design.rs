use serde::{Deserialize, Serialize};

/// Reusable venue seating template. Owned and edited by design authors;
/// events never read it directly — they sell against a frozen
/// [`GeometrySnapshot`](crate::models::GeometrySnapshot) taken at attach time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatingDesign {
    pub id: i64,
    pub venue_id: i64,
    pub name: String,
    /// Bumped on every author edit; instances record which version they froze.
    pub version: i32,
    pub status: DesignStatus,
    pub canvas_w: f64,
    pub canvas_h: f64,
    pub sections: Vec<DesignSection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "design_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DesignStatus {
    Draft,
    Published,
    Archived,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignSection {
    pub name: String,
    pub color: Option<String>,
    pub seat_color: Option<String>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
    pub rows: Vec<DesignRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignRow {
    pub label: String,
    pub seats: Vec<DesignSeat>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignSeat {
    /// Stable across design versions; event seat rows key on it.
    pub seat_uid: String,
    pub label: String,
    pub x: f64,
    pub y: f64,
    /// Marked by the author for seats that physically cannot be sold
    /// (pillar views, tech booths). Materializes as `disabled` inventory.
    #[serde(default)]
    pub unavailable: bool,
}
