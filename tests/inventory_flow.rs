//! End-to-end inventory behavior over the in-memory store with a manual
//! clock: the state machine, hold expiry, reclamation, and the read model.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use seating_service::clock::ManualClock;
use seating_service::error::InventoryError;
use seating_service::models::{
    DesignRow, DesignSeat, DesignSection, DesignStatus, PriceTier, SeatAvailability, SeatStatus,
    SeatingDesign,
};
use seating_service::services::inventory::InventoryCoordinator;
use seating_service::services::seatmap::SeatMapReader;
use seating_service::services::sweep::ReclaimSweeper;
use seating_service::store::{InventoryStore, MemoryInventoryStore};

const EVENT_ID: i64 = 42;
const DESIGN_ID: i64 = 7;

fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

fn design_seat(uid: &str, label: &str, unavailable: bool) -> DesignSeat {
    DesignSeat {
        seat_uid: uid.to_string(),
        label: label.to_string(),
        x: 0.0,
        y: 0.0,
        unavailable,
    }
}

fn sample_design() -> SeatingDesign {
    SeatingDesign {
        id: DESIGN_ID,
        venue_id: 3,
        name: "Main hall".to_string(),
        version: 1,
        status: DesignStatus::Published,
        canvas_w: 800.0,
        canvas_h: 600.0,
        sections: vec![DesignSection {
            name: "Parterre".to_string(),
            color: Some("#334455".to_string()),
            seat_color: None,
            x: 0.0,
            y: 0.0,
            width: 400.0,
            height: 300.0,
            rotation: 0.0,
            rows: vec![
                DesignRow {
                    label: "A".to_string(),
                    seats: vec![
                        design_seat("A1", "1", false),
                        design_seat("A2", "2", false),
                    ],
                },
                DesignRow {
                    label: "B".to_string(),
                    seats: vec![
                        design_seat("B1", "1", false),
                        design_seat("B2", "2", true),
                    ],
                },
            ],
        }],
    }
}

struct Harness {
    store: Arc<MemoryInventoryStore>,
    clock: Arc<ManualClock>,
    coordinator: InventoryCoordinator<MemoryInventoryStore>,
    reader: SeatMapReader<MemoryInventoryStore>,
    instance_id: i64,
}

async fn setup() -> Harness {
    let store = Arc::new(MemoryInventoryStore::new());
    store.add_design(sample_design());
    let clock = Arc::new(ManualClock::new(start_time()));
    let coordinator = InventoryCoordinator::new(store.clone(), clock.clone());
    let reader = SeatMapReader::new(store.clone(), clock.clone());

    let instance = coordinator
        .create_instance(EVENT_ID, DESIGN_ID)
        .await
        .unwrap();
    coordinator.initialize_seats(instance.id).await.unwrap();

    Harness {
        store,
        clock,
        coordinator,
        reader,
        instance_id: instance.id,
    }
}

async fn seat_status(h: &Harness, uid: &str) -> (SeatStatus, i32) {
    let seat = h.store.seat(h.instance_id, uid).await.unwrap().unwrap();
    (seat.status, seat.version)
}

/* ---------- initialization ---------- */

#[tokio::test]
async fn initialization_is_idempotent() {
    let h = setup().await;
    // setup already initialized; a second run must insert nothing
    let inserted = h.coordinator.initialize_seats(h.instance_id).await.unwrap();
    assert_eq!(inserted, 0);
    assert_eq!(h.store.seats(h.instance_id).await.unwrap().len(), 4);
}

#[tokio::test]
async fn initialization_maps_unavailable_design_seats_to_disabled() {
    let h = setup().await;
    let (status, version) = seat_status(&h, "B2").await;
    assert_eq!(status, SeatStatus::Disabled);
    assert_eq!(version, 1);

    let err = h
        .coordinator
        .hold(h.instance_id, "B2", "s1", Duration::seconds(60))
        .await
        .unwrap_err();
    assert!(matches!(err, InventoryError::SeatUnavailable));
}

#[tokio::test]
async fn initialization_rejects_empty_geometry() {
    let store = Arc::new(MemoryInventoryStore::new());
    let mut design = sample_design();
    design.sections.clear();
    store.add_design(design);
    let clock = Arc::new(ManualClock::new(start_time()));
    let coordinator = InventoryCoordinator::new(store.clone(), clock);

    let instance = coordinator
        .create_instance(EVENT_ID, DESIGN_ID)
        .await
        .unwrap();
    let err = coordinator.initialize_seats(instance.id).await.unwrap_err();
    assert!(matches!(err, InventoryError::EmptyGeometry));
}

/* ---------- hold / expiry / reclaim ---------- */

#[tokio::test]
async fn hold_expiry_reclaim_rehold_scenario() {
    let h = setup().await;

    assert_eq!(seat_status(&h, "A1").await, (SeatStatus::Available, 1));

    let receipt = h
        .coordinator
        .hold(h.instance_id, "A1", "s1", Duration::seconds(60))
        .await
        .unwrap();
    assert_eq!(receipt.version, 2);
    assert_eq!(receipt.expires_at, start_time() + Duration::seconds(60));
    assert_eq!(seat_status(&h, "A1").await, (SeatStatus::Held, 2));

    let err = h
        .coordinator
        .hold(h.instance_id, "A1", "s2", Duration::seconds(60))
        .await
        .unwrap_err();
    assert!(matches!(err, InventoryError::SeatUnavailable));

    h.clock.advance(Duration::seconds(61));

    let reclaimed = h.coordinator.reclaim_expired(h.instance_id).await.unwrap();
    assert_eq!(reclaimed, 1);
    assert_eq!(seat_status(&h, "A1").await, (SeatStatus::Available, 3));
    assert!(h
        .store
        .hold_for_seat(h.instance_id, "A1")
        .await
        .unwrap()
        .is_none());

    let receipt = h
        .coordinator
        .hold(h.instance_id, "A1", "s2", Duration::seconds(60))
        .await
        .unwrap();
    assert_eq!(receipt.version, 4);
}

#[tokio::test]
async fn expired_hold_is_reclaimed_inline_by_next_hold() {
    let h = setup().await;

    h.coordinator
        .hold(h.instance_id, "A1", "s1", Duration::seconds(60))
        .await
        .unwrap();
    h.clock.advance(Duration::seconds(120));

    // No sweep ran; the next hold attempt reclaims on its own.
    let receipt = h
        .coordinator
        .hold(h.instance_id, "A1", "s2", Duration::seconds(60))
        .await
        .unwrap();
    assert_eq!(receipt.version, 4); // +1 reclaim, +1 new hold

    let hold = h
        .store
        .hold_for_seat(h.instance_id, "A1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(hold.session_id, "s2");
}

#[tokio::test]
async fn concurrent_holds_have_exactly_one_winner() {
    let h = setup().await;

    let c1 = h.coordinator.clone();
    let c2 = h.coordinator.clone();
    let id = h.instance_id;
    let (r1, r2) = tokio::join!(
        c1.hold(id, "A1", "s1", Duration::seconds(60)),
        c2.hold(id, "A1", "s2", Duration::seconds(60)),
    );

    let winners = [r1.is_ok(), r2.is_ok()].iter().filter(|w| **w).count();
    assert_eq!(winners, 1);
    for result in [r1, r2] {
        if let Err(e) = result {
            assert!(matches!(
                e,
                InventoryError::SeatUnavailable | InventoryError::VersionConflict
            ));
        }
    }
    assert_eq!(seat_status(&h, "A1").await.0, SeatStatus::Held);
}

#[tokio::test]
async fn hold_of_unknown_seat_fails() {
    let h = setup().await;
    let err = h
        .coordinator
        .hold(h.instance_id, "Z9", "s1", Duration::seconds(60))
        .await
        .unwrap_err();
    assert!(matches!(err, InventoryError::SeatNotFound));
}

/* ---------- extend ---------- */

#[tokio::test]
async fn extend_pushes_expiry_without_version_bump() {
    let h = setup().await;

    let receipt = h
        .coordinator
        .hold(h.instance_id, "A1", "s1", Duration::seconds(60))
        .await
        .unwrap();
    h.clock.advance(Duration::seconds(40));

    let expires_at = h
        .coordinator
        .extend(h.instance_id, "A1", "s1", Duration::seconds(60))
        .await
        .unwrap();
    assert_eq!(
        expires_at,
        start_time() + Duration::seconds(40) + Duration::seconds(60)
    );
    assert_eq!(seat_status(&h, "A1").await, (SeatStatus::Held, receipt.version));

    // The original deadline passes; the extended hold must survive the sweep.
    h.clock.advance(Duration::seconds(30));
    let reclaimed = h.coordinator.reclaim_expired(h.instance_id).await.unwrap();
    assert_eq!(reclaimed, 0);
    assert_eq!(seat_status(&h, "A1").await.0, SeatStatus::Held);
}

#[tokio::test]
async fn extend_is_refused_for_non_owners_and_expired_holds() {
    let h = setup().await;

    h.coordinator
        .hold(h.instance_id, "A1", "s1", Duration::seconds(60))
        .await
        .unwrap();

    let err = h
        .coordinator
        .extend(h.instance_id, "A1", "s2", Duration::seconds(60))
        .await
        .unwrap_err();
    assert!(matches!(err, InventoryError::HoldNotOwned));

    h.clock.advance(Duration::seconds(61));
    let err = h
        .coordinator
        .extend(h.instance_id, "A1", "s1", Duration::seconds(60))
        .await
        .unwrap_err();
    assert!(matches!(err, InventoryError::HoldExpired));
}

/* ---------- release ---------- */

#[tokio::test]
async fn release_is_idempotent_for_the_owner() {
    let h = setup().await;

    h.coordinator
        .hold(h.instance_id, "A1", "s1", Duration::seconds(60))
        .await
        .unwrap();
    h.coordinator
        .release(h.instance_id, "A1", "s1")
        .await
        .unwrap();
    assert_eq!(seat_status(&h, "A1").await, (SeatStatus::Available, 3));

    // duplicate client retry
    h.coordinator
        .release(h.instance_id, "A1", "s1")
        .await
        .unwrap();
    assert_eq!(seat_status(&h, "A1").await, (SeatStatus::Available, 3));
}

#[tokio::test]
async fn release_rejects_other_sessions_live_hold() {
    let h = setup().await;

    h.coordinator
        .hold(h.instance_id, "A1", "s1", Duration::seconds(60))
        .await
        .unwrap();
    let err = h
        .coordinator
        .release(h.instance_id, "A1", "s2")
        .await
        .unwrap_err();
    assert!(matches!(err, InventoryError::HoldNotOwned));
    assert_eq!(seat_status(&h, "A1").await.0, SeatStatus::Held);
}

/* ---------- confirm ---------- */

#[tokio::test]
async fn confirm_is_idempotent_on_order_ref() {
    let h = setup().await;

    h.coordinator
        .hold(h.instance_id, "A1", "s1", Duration::seconds(60))
        .await
        .unwrap();
    let v1 = h
        .coordinator
        .confirm(h.instance_id, "A1", "s1", "order-1")
        .await
        .unwrap();
    assert_eq!(v1, 3);
    assert_eq!(seat_status(&h, "A1").await, (SeatStatus::Sold, 3));

    // at-least-once retry from order finalization
    let v2 = h
        .coordinator
        .confirm(h.instance_id, "A1", "s1", "order-1")
        .await
        .unwrap();
    assert_eq!(v2, 3);

    let err = h
        .coordinator
        .confirm(h.instance_id, "A1", "s1", "order-2")
        .await
        .unwrap_err();
    assert!(matches!(err, InventoryError::SeatAlreadySold));

    let seat = h.store.seat(h.instance_id, "A1").await.unwrap().unwrap();
    assert_eq!(seat.order_ref.as_deref(), Some("order-1"));
}

#[tokio::test]
async fn confirm_requires_a_live_owned_hold() {
    let h = setup().await;

    let err = h
        .coordinator
        .confirm(h.instance_id, "A1", "s1", "order-1")
        .await
        .unwrap_err();
    assert!(matches!(err, InventoryError::HoldNotOwned));

    h.coordinator
        .hold(h.instance_id, "A1", "s1", Duration::seconds(60))
        .await
        .unwrap();

    let err = h
        .coordinator
        .confirm(h.instance_id, "A1", "s2", "order-1")
        .await
        .unwrap_err();
    assert!(matches!(err, InventoryError::HoldNotOwned));

    h.clock.advance(Duration::seconds(61));
    let err = h
        .coordinator
        .confirm(h.instance_id, "A1", "s1", "order-1")
        .await
        .unwrap_err();
    assert!(matches!(err, InventoryError::HoldExpired));
}

#[tokio::test]
async fn sweep_never_unsells_a_confirmed_seat() {
    let h = setup().await;

    h.coordinator
        .hold(h.instance_id, "A1", "s1", Duration::seconds(60))
        .await
        .unwrap();
    h.coordinator
        .confirm(h.instance_id, "A1", "s1", "order-1")
        .await
        .unwrap();

    h.clock.advance(Duration::seconds(3600));
    let reclaimed = h.coordinator.reclaim_expired(h.instance_id).await.unwrap();
    assert_eq!(reclaimed, 0);
    assert_eq!(seat_status(&h, "A1").await.0, SeatStatus::Sold);
}

/* ---------- multi-seat hold ---------- */

#[tokio::test]
async fn hold_many_rolls_back_on_partial_failure() {
    let h = setup().await;

    // B1 goes to another buyer first
    h.coordinator
        .hold(h.instance_id, "B1", "other", Duration::seconds(60))
        .await
        .unwrap();

    let err = h
        .coordinator
        .hold_many(
            h.instance_id,
            &["A1".to_string(), "A2".to_string(), "B1".to_string()],
            "s1",
            Duration::seconds(60),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, InventoryError::SeatUnavailable));

    // the two acquired holds were rolled back
    assert_eq!(seat_status(&h, "A1").await.0, SeatStatus::Available);
    assert_eq!(seat_status(&h, "A2").await.0, SeatStatus::Available);
    assert!(h
        .store
        .hold_for_seat(h.instance_id, "A1")
        .await
        .unwrap()
        .is_none());
    assert!(h
        .store
        .hold_for_seat(h.instance_id, "A2")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn hold_many_claims_all_seats_on_success() {
    let h = setup().await;

    let receipts = h
        .coordinator
        .hold_many(
            h.instance_id,
            &["A1".to_string(), "A2".to_string()],
            "s1",
            Duration::seconds(60),
        )
        .await
        .unwrap();
    assert_eq!(receipts.len(), 2);
    assert_eq!(seat_status(&h, "A1").await.0, SeatStatus::Held);
    assert_eq!(seat_status(&h, "A2").await.0, SeatStatus::Held);
}

/* ---------- operator block / unblock ---------- */

#[tokio::test]
async fn block_and_unblock_round_trip() {
    let h = setup().await;

    let blocked = h
        .coordinator
        .block_seats(h.instance_id, &["A1".to_string(), "B2".to_string()])
        .await
        .unwrap();
    // B2 is disabled, so only A1 flips
    assert_eq!(blocked, 1);
    assert_eq!(seat_status(&h, "A1").await, (SeatStatus::Blocked, 2));

    let err = h
        .coordinator
        .hold(h.instance_id, "A1", "s1", Duration::seconds(60))
        .await
        .unwrap_err();
    assert!(matches!(err, InventoryError::SeatUnavailable));

    let unblocked = h
        .coordinator
        .unblock_seats(h.instance_id, &["A1".to_string()])
        .await
        .unwrap();
    assert_eq!(unblocked, 1);
    assert_eq!(seat_status(&h, "A1").await, (SeatStatus::Available, 3));
}

#[tokio::test]
async fn held_seats_cannot_be_blocked() {
    let h = setup().await;

    h.coordinator
        .hold(h.instance_id, "A1", "s1", Duration::seconds(60))
        .await
        .unwrap();
    let blocked = h
        .coordinator
        .block_seats(h.instance_id, &["A1".to_string()])
        .await
        .unwrap();
    assert_eq!(blocked, 0);
    assert_eq!(seat_status(&h, "A1").await.0, SeatStatus::Held);
}

/* ---------- seat map ---------- */

#[tokio::test]
async fn seat_map_classifies_relative_to_viewer() {
    let h = setup().await;

    h.coordinator
        .hold(h.instance_id, "A1", "s1", Duration::seconds(60))
        .await
        .unwrap();
    h.coordinator
        .hold(h.instance_id, "A2", "s2", Duration::seconds(60))
        .await
        .unwrap();
    h.coordinator
        .confirm(h.instance_id, "A2", "s2", "order-9")
        .await
        .unwrap();

    let map = h.reader.seat_map(h.instance_id, Some("s1")).await.unwrap();
    let availability: Vec<(String, SeatAvailability)> = map
        .sections
        .iter()
        .flat_map(|s| &s.rows)
        .flat_map(|r| &r.seats)
        .map(|s| (s.seat_uid.clone(), s.availability))
        .collect();

    assert_eq!(
        availability,
        vec![
            ("A1".to_string(), SeatAvailability::HeldByMe),
            ("A2".to_string(), SeatAvailability::Sold),
            ("B1".to_string(), SeatAvailability::Available),
            ("B2".to_string(), SeatAvailability::Disabled),
        ]
    );

    let map = h.reader.seat_map(h.instance_id, Some("s3")).await.unwrap();
    let a1 = map.sections[0].rows[0].seats[0].clone();
    assert_eq!(a1.availability, SeatAvailability::HeldByOther);
    assert_eq!(a1.version, 2);
}

#[tokio::test]
async fn seat_map_shows_expired_holds_as_available() {
    let h = setup().await;

    h.coordinator
        .hold(h.instance_id, "A1", "s1", Duration::seconds(60))
        .await
        .unwrap();
    h.clock.advance(Duration::seconds(61));

    // Status is still `held` on disk, but no live hold backs it.
    let map = h.reader.seat_map(h.instance_id, Some("s2")).await.unwrap();
    let a1 = &map.sections[0].rows[0].seats[0];
    assert_eq!(a1.availability, SeatAvailability::Available);
}

#[tokio::test]
async fn seat_map_resolves_tier_price_and_override() {
    let h = setup().await;

    h.store.add_price_tier(PriceTier {
        id: 1,
        code: "vip".to_string(),
        name: "VIP".to_string(),
        price: 150.0,
        color: Some("#ffd700".to_string()),
    });
    h.store.assign_price_tier(h.instance_id, "A1", 1);
    h.store.assign_price_tier(h.instance_id, "A2", 1);

    let map = h.reader.seat_map(h.instance_id, None).await.unwrap();
    let a1 = &map.sections[0].rows[0].seats[0];
    assert_eq!(a1.price, Some(150.0));
    assert_eq!(a1.tier_color.as_deref(), Some("#ffd700"));

    let b1 = &map.sections[0].rows[1].seats[0];
    assert_eq!(b1.price, None);
}

/* ---------- background sweep ---------- */

#[tokio::test]
async fn sweeper_reclaims_across_instances() {
    let store = Arc::new(MemoryInventoryStore::new());
    store.add_design(sample_design());
    let clock = Arc::new(ManualClock::new(start_time()));
    let coordinator = InventoryCoordinator::new(store.clone(), clock.clone());

    let first = coordinator.create_instance(EVENT_ID, DESIGN_ID).await.unwrap();
    coordinator.initialize_seats(first.id).await.unwrap();
    let second = coordinator.create_instance(EVENT_ID + 1, DESIGN_ID).await.unwrap();
    coordinator.initialize_seats(second.id).await.unwrap();

    coordinator
        .hold(first.id, "A1", "s1", Duration::seconds(60))
        .await
        .unwrap();
    coordinator
        .hold(second.id, "A1", "s2", Duration::seconds(30))
        .await
        .unwrap();
    coordinator
        .hold(second.id, "A2", "s2", Duration::seconds(600))
        .await
        .unwrap();

    clock.advance(Duration::seconds(90));

    let sweeper = ReclaimSweeper::new(store.clone(), coordinator.clone(), clock.clone(), None);
    let stats = sweeper.run_once().await;
    assert_eq!(stats.instances_swept, 2);
    assert_eq!(stats.seats_reclaimed, 2);

    // the long hold survives
    let seat = store.seat(second.id, "A2").await.unwrap().unwrap();
    assert_eq!(seat.status, SeatStatus::Held);

    // nothing left to do on the next pass
    let stats = sweeper.run_once().await;
    assert_eq!(stats.seats_reclaimed, 0);
}
