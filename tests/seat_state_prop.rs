//! Property test: under any interleaving of operations on one seat, the
//! version counter is monotonic, `held` status and a hold row always appear
//! together, and a sold seat stays sold under its order reference.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use seating_service::clock::ManualClock;
use seating_service::models::{
    DesignRow, DesignSeat, DesignSection, DesignStatus, SeatStatus, SeatingDesign,
};
use seating_service::services::inventory::InventoryCoordinator;
use seating_service::store::{InventoryStore, MemoryInventoryStore};

const SEAT: &str = "A1";

#[derive(Debug, Clone)]
enum Op {
    Hold { session: u8, ttl: i64 },
    Extend { session: u8, ttl: i64 },
    Release { session: u8 },
    Confirm { session: u8, order: u8 },
    Advance { secs: i64 },
    Reclaim,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..3, 10i64..120).prop_map(|(session, ttl)| Op::Hold { session, ttl }),
        (0u8..3, 10i64..120).prop_map(|(session, ttl)| Op::Extend { session, ttl }),
        (0u8..3).prop_map(|session| Op::Release { session }),
        (0u8..3, 0u8..2).prop_map(|(session, order)| Op::Confirm { session, order }),
        (1i64..180).prop_map(|secs| Op::Advance { secs }),
        Just(Op::Reclaim),
    ]
}

fn one_seat_design() -> SeatingDesign {
    SeatingDesign {
        id: 1,
        venue_id: 1,
        name: "Prop hall".to_string(),
        version: 1,
        status: DesignStatus::Published,
        canvas_w: 100.0,
        canvas_h: 100.0,
        sections: vec![DesignSection {
            name: "S".to_string(),
            color: None,
            seat_color: None,
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
            rotation: 0.0,
            rows: vec![DesignRow {
                label: "A".to_string(),
                seats: vec![DesignSeat {
                    seat_uid: SEAT.to_string(),
                    label: "1".to_string(),
                    x: 0.0,
                    y: 0.0,
                    unavailable: false,
                }],
            }],
        }],
    }
}

fn session_name(session: u8) -> String {
    format!("session-{session}")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn seat_state_stays_consistent(ops in prop::collection::vec(op_strategy(), 1..50)) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();

        rt.block_on(async move {
            let store = Arc::new(MemoryInventoryStore::new());
            store.add_design(one_seat_design());
            let clock = Arc::new(ManualClock::new(
                Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
            ));
            let coordinator = InventoryCoordinator::new(store.clone(), clock.clone());
            let instance = coordinator.create_instance(1, 1).await.unwrap();
            coordinator.initialize_seats(instance.id).await.unwrap();

            let mut last_version = 1;
            let mut sold_under: Option<String> = None;

            for op in ops {
                match op {
                    Op::Hold { session, ttl } => {
                        let _ = coordinator
                            .hold(instance.id, SEAT, &session_name(session), Duration::seconds(ttl))
                            .await;
                    }
                    Op::Extend { session, ttl } => {
                        let _ = coordinator
                            .extend(instance.id, SEAT, &session_name(session), Duration::seconds(ttl))
                            .await;
                    }
                    Op::Release { session } => {
                        let _ = coordinator
                            .release(instance.id, SEAT, &session_name(session))
                            .await;
                    }
                    Op::Confirm { session, order } => {
                        let result = coordinator
                            .confirm(instance.id, SEAT, &session_name(session), &format!("order-{order}"))
                            .await;
                        if result.is_ok() && sold_under.is_none() {
                            sold_under = Some(format!("order-{order}"));
                        }
                    }
                    Op::Advance { secs } => {
                        clock.advance(Duration::seconds(secs));
                    }
                    Op::Reclaim => {
                        let _ = coordinator.reclaim_expired(instance.id).await;
                    }
                }

                let seat = store.seat(instance.id, SEAT).await.unwrap().unwrap();
                let hold = store.hold_for_seat(instance.id, SEAT).await.unwrap();

                // Version is totally ordered; one operation moves it by at
                // most 2 (inline reclaim plus new hold).
                assert!(seat.version >= last_version);
                assert!(seat.version - last_version <= 2);
                last_version = seat.version;

                // held status and a hold row appear and disappear together
                assert_eq!(seat.status == SeatStatus::Held, hold.is_some());

                // sold is terminal and keeps its original order reference
                if let Some(order_ref) = &sold_under {
                    assert_eq!(seat.status, SeatStatus::Sold);
                    assert_eq!(seat.order_ref.as_deref(), Some(order_ref.as_str()));
                }
            }
        });
    }
}
