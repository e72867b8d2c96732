use crate::model::{
    id::{NotificationId, ReservationId, UserId},
    reservation::{Reservation, REMINDER_LEAD_MINUTES},
};
use chrono::{DateTime, Utc};
use derive_new::new;
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
pub enum NotificationCategory {
    ReservationConfirmed,
    ReservationReminder,
    ReservationCancelled,
    ReservationExpired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub notification_id: NotificationId,
    pub user_id: UserId,
    pub title: String,
    pub message: String,
    pub category: NotificationCategory,
    pub is_read: bool,
    pub related_id: Option<ReservationId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NotificationList {
    pub items: Vec<Notification>,
    pub unread_count: i64,
}

/// 通知先に渡す 1 件分の内容
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct CreateNotification {
    pub user_id: UserId,
    pub title: String,
    pub message: String,
    pub category: NotificationCategory,
    pub related_id: Option<ReservationId>,
}

impl CreateNotification {
    pub fn reservation_created(reservation: &Reservation) -> Self {
        let start = reservation.window.start;
        Self::new(
            reservation.reserved_by,
            "Reservation Created!".into(),
            format!(
                "Your {} reservation is confirmed for {} at {}. \
                 You will receive a reminder {} minutes before.",
                reservation.kind,
                start.format("%b %d"),
                start.format("%H:%M"),
                REMINDER_LEAD_MINUTES,
            ),
            NotificationCategory::ReservationConfirmed,
            Some(reservation.reservation_id),
        )
    }

    pub fn reservation_confirmed(reservation: &Reservation) -> Self {
        Self::new(
            reservation.reserved_by,
            "Reservation Confirmed".into(),
            format!(
                "Your reservation at {} is confirmed. See you there!",
                reservation.window.start.format("%H:%M"),
            ),
            NotificationCategory::ReservationConfirmed,
            Some(reservation.reservation_id),
        )
    }

    pub fn reservation_cancelled_by_operator(reservation: &Reservation) -> Self {
        let start = reservation.window.start;
        Self::new(
            reservation.reserved_by,
            "Reservation Cancelled".into(),
            format!(
                "Your reservation on {} at {} has been cancelled by admin.",
                start.format("%b %d"),
                start.format("%H:%M"),
            ),
            NotificationCategory::ReservationCancelled,
            Some(reservation.reservation_id),
        )
    }

    pub fn reservation_starting_soon(reservation: &Reservation) -> Self {
        Self::new(
            reservation.reserved_by,
            "Reservation Starting Soon!".into(),
            format!(
                "Your reservation starts at {}. Please confirm to keep your seat!",
                reservation.window.start.format("%H:%M"),
            ),
            NotificationCategory::ReservationReminder,
            Some(reservation.reservation_id),
        )
    }

    pub fn reservation_expired(reservation: &Reservation) -> Self {
        Self::new(
            reservation.reserved_by,
            "Reservation Expired".into(),
            format!(
                "Your reservation at {} was automatically cancelled because it was not confirmed.",
                reservation.window.start.format("%H:%M"),
            ),
            NotificationCategory::ReservationExpired,
            Some(reservation.reservation_id),
        )
    }
}
