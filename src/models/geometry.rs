use serde::{Deserialize, Serialize};

/// Immutable, self-contained copy of a seating design's structure, frozen at
/// the moment it is attached to an event. Deliberately a distinct type from
/// [`SeatingDesign`](crate::models::SeatingDesign): nothing that mutates the
/// design can reach into a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometrySnapshot {
    pub design_id: i64,
    pub design_version: i32,
    pub canvas_w: f64,
    pub canvas_h: f64,
    pub sections: Vec<GeometrySection>,
}

impl GeometrySnapshot {
    pub fn seat_count(&self) -> usize {
        self.sections
            .iter()
            .flat_map(|s| &s.rows)
            .map(|r| r.seats.len())
            .sum()
    }

    pub fn seats(&self) -> impl Iterator<Item = (&GeometrySection, &GeometryRow, &GeometrySeat)> {
        self.sections.iter().flat_map(|section| {
            section.rows.iter().flat_map(move |row| {
                row.seats.iter().map(move |seat| (section, row, seat))
            })
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometrySection {
    pub name: String,
    pub color: Option<String>,
    pub seat_color: Option<String>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
    pub rows: Vec<GeometryRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryRow {
    pub label: String,
    pub seats: Vec<GeometrySeat>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometrySeat {
    pub seat_uid: String,
    pub label: String,
    pub x: f64,
    pub y: f64,
    pub unavailable: bool,
}
