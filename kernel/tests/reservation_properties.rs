//! 予約の作成・確定・キャンセル・スイープをランダムに並べても
//! 座席の二重予約が起きず、期限切れの前に必ずリマインダーが送られていることを確認する。

use chrono::{DateTime, Duration, TimeZone, Utc};
use kernel::model::{
    id::{ReservationId, UserId},
    reservation::{
        event::CreateReservation,
        index::SeatTimeIndex,
        policy,
        transition::ReservationTransition,
        Reservation, ReservationKind, ReservationStatus, TimeWindow,
    },
};
use proptest::prelude::*;

const SEATS: [&str; 4] = ["A1", "A2", "B1", "B2"];

#[derive(Debug, Clone)]
enum Op {
    Create {
        group: bool,
        start_in_min: i64,
        length_min: i64,
        seat_mask: u8,
    },
    Confirm(usize),
    Cancel(usize),
    Sweep { advance_min: i64 },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (any::<bool>(), -30i64..300, 5i64..200, 1u8..16).prop_map(
            |(group, start_in_min, length_min, seat_mask)| Op::Create {
                group,
                start_in_min,
                length_min,
                seat_mask,
            }
        ),
        1 => (0usize..32).prop_map(Op::Confirm),
        1 => (0usize..32).prop_map(Op::Cancel),
        2 => (0i64..40).prop_map(|advance_min| Op::Sweep { advance_min }),
    ]
}

struct Ledger {
    now: DateTime<Utc>,
    reservations: Vec<Reservation>,
}

impl Ledger {
    fn new() -> Self {
        Self {
            now: Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).unwrap(),
            reservations: Vec::new(),
        }
    }

    fn apply(&mut self, op: Op) {
        match op {
            Op::Create {
                group,
                start_in_min,
                length_min,
                seat_mask,
            } => {
                let seats: Vec<String> = SEATS
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| seat_mask & (1 << i) != 0)
                    .map(|(_, s)| s.to_string())
                    .collect();
                let kind = if group {
                    ReservationKind::Group
                } else {
                    ReservationKind::Solo
                };
                let start = self.now + Duration::minutes(start_in_min);
                let event = CreateReservation::new(
                    UserId::new(),
                    kind,
                    TimeWindow::new(start, start + Duration::minutes(length_min)),
                    seats,
                    None,
                    self.now,
                );
                if policy::validate(&event).is_err() {
                    return;
                }
                let index = SeatTimeIndex::from_reservations(&self.reservations);
                if !index.unavailable(&event.window, &event.seats).is_empty() {
                    return;
                }
                self.reservations.push(Reservation {
                    reservation_id: ReservationId::new(),
                    reserved_by: event.reserved_by,
                    kind: event.kind,
                    window: event.window,
                    status: ReservationStatus::Active,
                    seats: event.seats,
                    notes: None,
                    reminder_sent_at: None,
                    confirmed_at: None,
                    cancelled_at: None,
                    created_at: self.now,
                });
            }
            Op::Confirm(i) => {
                let now = self.now;
                if let Some(r) = self.nth(i) {
                    if let Ok(next) = r.status.transition(ReservationTransition::Confirm) {
                        r.status = next;
                        r.confirmed_at = Some(now);
                    }
                }
            }
            Op::Cancel(i) => {
                let now = self.now;
                if let Some(r) = self.nth(i) {
                    match r.status.transition(ReservationTransition::Cancel) {
                        Ok(next) => {
                            r.status = next;
                            r.cancelled_at = Some(now);
                        }
                        Err(_) => {
                            let before = r.cancelled_at;
                            assert!(r.status.is_terminal());
                            assert_eq!(r.cancelled_at, before);
                        }
                    }
                }
            }
            Op::Sweep { advance_min } => {
                self.now += Duration::minutes(advance_min);
                let now = self.now;
                for r in self.reservations.iter_mut() {
                    if r.needs_reminder(now) {
                        assert!(r.reminder_sent_at.is_none());
                        r.reminder_sent_at = Some(now);
                    }
                }
                for r in self.reservations.iter_mut() {
                    if r.is_expirable(now) {
                        r.status = r
                            .status
                            .transition(ReservationTransition::Expire)
                            .expect("expirable reservations are active");
                    }
                }
            }
        }
    }

    fn nth(&mut self, i: usize) -> Option<&mut Reservation> {
        let len = self.reservations.len();
        if len == 0 {
            None
        } else {
            self.reservations.get_mut(i % len)
        }
    }

    fn assert_invariants(&self) {
        let live: Vec<&Reservation> = self.reservations.iter().filter(|r| r.is_live()).collect();
        for (i, a) in live.iter().enumerate() {
            for b in &live[i + 1..] {
                let shares_seat = a.seats.iter().any(|s| b.seats.contains(s));
                assert!(
                    !(shares_seat && a.window.overlaps(&b.window)),
                    "double booking between {a:?} and {b:?}"
                );
            }
        }
        for r in &self.reservations {
            if r.status == ReservationStatus::Expired {
                assert!(r.reminder_sent_at.is_some(), "expired without reminder: {r:?}");
                assert!(r.window.start <= self.now);
            }
            if r.kind == ReservationKind::Solo {
                assert_eq!(r.seats.len(), 1);
            } else {
                assert!(!r.seats.is_empty());
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn random_sequences_keep_reservation_invariants(ops in prop::collection::vec(op(), 1..60)) {
        let mut ledger = Ledger::new();
        for op in ops {
            ledger.apply(op);
            ledger.assert_invariants();
        }
    }

    #[test]
    fn sweeping_twice_at_the_same_instant_changes_nothing(
        ops in prop::collection::vec(op(), 1..40),
    ) {
        let mut ledger = Ledger::new();
        for op in ops {
            ledger.apply(op);
        }
        ledger.apply(Op::Sweep { advance_min: 0 });
        let snapshot = ledger.reservations.clone();
        ledger.apply(Op::Sweep { advance_min: 0 });
        prop_assert_eq!(snapshot, ledger.reservations);
    }
}
