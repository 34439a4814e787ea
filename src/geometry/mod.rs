//! Geometry snapshot builder.
//!
//! Pure transformation from a mutable [`SeatingDesign`] into the immutable
//! [`GeometrySnapshot`] an event sells against. Deterministic: the same design
//! version always serializes to the same bytes, so re-snapshotting is
//! idempotent and snapshots can be compared in tests.

use std::collections::HashSet;

use crate::error::InventoryError;
use crate::models::{
    DesignStatus, GeometryRow, GeometrySeat, GeometrySection, GeometrySnapshot, SeatingDesign,
};

/// Freeze `design` into a self-contained snapshot.
///
/// Refuses designs that are not published or whose geometry is structurally
/// inconsistent (duplicate seat identifiers). Preserves the author's section,
/// row, and seat order.
pub fn snapshot(design: &SeatingDesign) -> Result<GeometrySnapshot, InventoryError> {
    if design.status != DesignStatus::Published {
        return Err(InventoryError::InvalidDesign(format!(
            "design {} is not published",
            design.id
        )));
    }

    let mut seen = HashSet::new();
    for section in &design.sections {
        for row in &section.rows {
            for seat in &row.seats {
                if seat.seat_uid.is_empty() {
                    return Err(InventoryError::InvalidDesign(format!(
                        "empty seat_uid in section '{}' row '{}'",
                        section.name, row.label
                    )));
                }
                if !seen.insert(seat.seat_uid.as_str()) {
                    return Err(InventoryError::InvalidDesign(format!(
                        "duplicate seat_uid '{}'",
                        seat.seat_uid
                    )));
                }
            }
        }
    }

    Ok(GeometrySnapshot {
        design_id: design.id,
        design_version: design.version,
        canvas_w: design.canvas_w,
        canvas_h: design.canvas_h,
        sections: design
            .sections
            .iter()
            .map(|section| GeometrySection {
                name: section.name.clone(),
                color: section.color.clone(),
                seat_color: section.seat_color.clone(),
                x: section.x,
                y: section.y,
                width: section.width,
                height: section.height,
                rotation: section.rotation,
                rows: section
                    .rows
                    .iter()
                    .map(|row| GeometryRow {
                        label: row.label.clone(),
                        seats: row
                            .seats
                            .iter()
                            .map(|seat| GeometrySeat {
                                seat_uid: seat.seat_uid.clone(),
                                label: seat.label.clone(),
                                x: seat.x,
                                y: seat.y,
                                unavailable: seat.unavailable,
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DesignRow, DesignSeat, DesignSection};

    fn seat(uid: &str, label: &str) -> DesignSeat {
        DesignSeat {
            seat_uid: uid.to_string(),
            label: label.to_string(),
            x: 10.0,
            y: 20.0,
            unavailable: false,
        }
    }

    fn design() -> SeatingDesign {
        SeatingDesign {
            id: 7,
            venue_id: 3,
            name: "Main hall".to_string(),
            version: 2,
            status: DesignStatus::Published,
            canvas_w: 800.0,
            canvas_h: 600.0,
            sections: vec![DesignSection {
                name: "Parterre".to_string(),
                color: Some("#aa3355".to_string()),
                seat_color: None,
                x: 0.0,
                y: 0.0,
                width: 400.0,
                height: 300.0,
                rotation: 0.0,
                rows: vec![DesignRow {
                    label: "A".to_string(),
                    seats: vec![seat("s-a1", "1"), seat("s-a2", "2")],
                }],
            }],
        }
    }

    #[test]
    fn snapshot_is_deterministic() {
        let d = design();
        let a = snapshot(&d).unwrap();
        let b = snapshot(&d).unwrap();
        assert_eq!(
            serde_json::to_vec(&a).unwrap(),
            serde_json::to_vec(&b).unwrap()
        );
    }

    #[test]
    fn snapshot_records_design_version() {
        let snap = snapshot(&design()).unwrap();
        assert_eq!(snap.design_id, 7);
        assert_eq!(snap.design_version, 2);
        assert_eq!(snap.seat_count(), 2);
    }

    #[test]
    fn rejects_unpublished_design() {
        let mut d = design();
        d.status = DesignStatus::Draft;
        assert!(matches!(
            snapshot(&d),
            Err(InventoryError::InvalidDesign(_))
        ));
    }

    #[test]
    fn rejects_duplicate_seat_uids() {
        let mut d = design();
        d.sections[0].rows[0].seats[1].seat_uid = "s-a1".to_string();
        assert!(matches!(
            snapshot(&d),
            Err(InventoryError::InvalidDesign(_))
        ));
    }

    #[test]
    fn snapshot_does_not_track_later_edits() {
        let mut d = design();
        let snap = snapshot(&d).unwrap();
        d.sections[0].rows[0].seats[0].x = 999.0;
        d.version += 1;
        assert_eq!(snap.sections[0].rows[0].seats[0].x, 10.0);
        assert_eq!(snap.design_version, 2);
    }
}
