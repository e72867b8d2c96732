//! 座席 × 時間帯の占有状況。生きている予約（Active / Confirmed）だけを数える。

use crate::model::reservation::{Reservation, ReservationStatus, TimeWindow};
use derive_new::new;
use std::collections::BTreeSet;

/// 座席 1 つ分の割り当て
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct SeatBooking {
    pub seat_id: String,
    pub window: TimeWindow,
    pub status: ReservationStatus,
}

#[derive(Debug, Default, Clone)]
pub struct SeatTimeIndex {
    bookings: Vec<SeatBooking>,
}

impl SeatTimeIndex {
    pub fn new(bookings: impl IntoIterator<Item = SeatBooking>) -> Self {
        Self {
            bookings: bookings
                .into_iter()
                .filter(|b| !b.status.is_terminal())
                .collect(),
        }
    }

    pub fn from_reservations<'a>(reservations: impl IntoIterator<Item = &'a Reservation>) -> Self {
        Self::new(reservations.into_iter().flat_map(|r| {
            r.seats
                .iter()
                .map(move |seat| SeatBooking::new(seat.clone(), r.window, r.status))
        }))
    }

    pub fn occupied_seats(&self, window: &TimeWindow) -> BTreeSet<String> {
        self.bookings
            .iter()
            .filter(|b| b.window.overlaps(window))
            .map(|b| b.seat_id.clone())
            .collect()
    }

    /// 要求された座席のうち、指定時間帯に埋まっているものを要求順で返す
    pub fn unavailable(&self, window: &TimeWindow, requested: &[String]) -> Vec<String> {
        let occupied = self.occupied_seats(window);
        requested
            .iter()
            .filter(|seat| occupied.contains(*seat))
            .cloned()
            .collect()
    }
}
