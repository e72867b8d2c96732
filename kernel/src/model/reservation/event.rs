use crate::model::{
    id::{ReservationId, UserId},
    reservation::{ReservationKind, TimeWindow},
    user::Caller,
};
use chrono::{DateTime, Utc};
use derive_new::new;

#[derive(Debug, Clone, new)]
pub struct CreateReservation {
    pub reserved_by: UserId,
    pub kind: ReservationKind,
    pub window: TimeWindow,
    pub seats: Vec<String>,
    pub notes: Option<String>,
    pub requested_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, new)]
pub struct ConfirmReservation {
    pub reservation_id: ReservationId,
    pub requested_by: UserId,
    pub confirmed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, new)]
pub struct CancelReservation {
    pub reservation_id: ReservationId,
    pub requested_by: Caller,
    pub cancelled_at: DateTime<Utc>,
}
