//! 予約作成リクエストの検証。I/O を持たず、同じ入力には同じ結果を返す。

use crate::model::reservation::{event::CreateReservation, ReservationKind};
use std::collections::HashSet;
use thiserror::Error;

pub const NOTES_MAX_LEN: usize = 500;
pub const SEAT_ID_MAX_LEN: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyViolation {
    #[error("Start time must be in the future")]
    StartNotInFuture,
    #[error("End time must be after start time")]
    EndNotAfterStart,
    #[error("{} reservations cannot exceed {max_hours} hours", capitalized(.kind))]
    DurationExceeded { kind: ReservationKind, max_hours: i64 },
    #[error("Please select at least one seat")]
    NoSeats,
    #[error("Solo reservations can only have 1 seat")]
    TooManySeatsForSolo,
    #[error("Seat {0} was selected more than once")]
    DuplicateSeat(String),
    #[error("Seat id must be between 1 and {} characters", SEAT_ID_MAX_LEN)]
    InvalidSeatId,
    #[error("Notes cannot exceed {} characters", NOTES_MAX_LEN)]
    NotesTooLong,
}

fn capitalized(kind: &ReservationKind) -> &'static str {
    match kind {
        ReservationKind::Solo => "Solo",
        ReservationKind::Group => "Group",
    }
}

pub fn validate(event: &CreateReservation) -> Result<(), PolicyViolation> {
    let window = &event.window;
    if window.start <= event.requested_at {
        return Err(PolicyViolation::StartNotInFuture);
    }
    if window.end <= window.start {
        return Err(PolicyViolation::EndNotAfterStart);
    }
    let max = event.kind.max_duration();
    if window.duration() > max {
        return Err(PolicyViolation::DurationExceeded {
            kind: event.kind,
            max_hours: max.num_hours(),
        });
    }
    if event.seats.is_empty() {
        return Err(PolicyViolation::NoSeats);
    }
    if event.kind == ReservationKind::Solo && event.seats.len() > 1 {
        return Err(PolicyViolation::TooManySeatsForSolo);
    }

    let mut seen = HashSet::with_capacity(event.seats.len());
    for seat in &event.seats {
        if seat.is_empty() || seat.chars().count() > SEAT_ID_MAX_LEN {
            return Err(PolicyViolation::InvalidSeatId);
        }
        if !seen.insert(seat.as_str()) {
            return Err(PolicyViolation::DuplicateSeat(seat.clone()));
        }
    }

    if let Some(notes) = &event.notes {
        if notes.chars().count() > NOTES_MAX_LEN {
            return Err(PolicyViolation::NotesTooLong);
        }
    }

    Ok(())
}
