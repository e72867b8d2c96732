use chrono::{DateTime, Utc};
use derive_new::new;
use garde::Validate;
use kernel::model::{
    id::{ReservationId, UserId},
    reservation::{event::CreateReservation, Reservation, ReservationKind, SweepReport, TimeWindow},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationTypeName {
    Solo,
    Group,
}

impl From<ReservationKind> for ReservationTypeName {
    fn from(value: ReservationKind) -> Self {
        match value {
            ReservationKind::Solo => Self::Solo,
            ReservationKind::Group => Self::Group,
        }
    }
}

impl From<ReservationTypeName> for ReservationKind {
    fn from(value: ReservationTypeName) -> Self {
        match value {
            ReservationTypeName::Solo => Self::Solo,
            ReservationTypeName::Group => Self::Group,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableSeatsQuery {
    #[serde(alias = "start")]
    pub start_time: DateTime<Utc>,
    #[serde(alias = "end")]
    pub end_time: DateTime<Utc>,
}

impl From<AvailableSeatsQuery> for TimeWindow {
    fn from(value: AvailableSeatsQuery) -> Self {
        TimeWindow::new(value.start_time, value.end_time)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableSeatsResponse {
    pub reserved_seats: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservationRequest {
    #[garde(skip)]
    pub reservation_type: ReservationTypeName,
    #[garde(skip)]
    pub start_time: DateTime<Utc>,
    #[garde(skip)]
    pub end_time: DateTime<Utc>,
    #[garde(length(min = 1), inner(length(min = 1)))]
    pub seats: Vec<String>,
    #[garde(skip)]
    pub notes: Option<String>,
}

#[derive(new)]
pub struct CreateReservationRequestWithUser(UserId, DateTime<Utc>, CreateReservationRequest);

impl From<CreateReservationRequestWithUser> for CreateReservation {
    fn from(value: CreateReservationRequestWithUser) -> Self {
        let CreateReservationRequestWithUser(
            reserved_by,
            requested_at,
            CreateReservationRequest {
                reservation_type,
                start_time,
                end_time,
                seats,
                notes,
            },
        ) = value;
        // 空白だけのメモは無しとして扱う
        let notes = notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        CreateReservation::new(
            reserved_by,
            reservation_type.into(),
            TimeWindow::new(start_time, end_time),
            seats.into_iter().map(|s| s.trim().to_string()).collect(),
            notes,
            requested_at,
        )
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedReservationResponse {
    pub message: String,
    pub reservation_id: ReservationId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub seats: Vec<String>,
    #[serde(rename = "type")]
    pub reservation_type: ReservationTypeName,
}

impl From<Reservation> for CreatedReservationResponse {
    fn from(value: Reservation) -> Self {
        Self {
            message: "Reservation created successfully".into(),
            reservation_id: value.reservation_id,
            start_time: value.window.start,
            end_time: value.window.end,
            seats: value.seats,
            reservation_type: value.kind.into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationResponse {
    pub id: ReservationId,
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub reservation_type: ReservationTypeName,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: String,
    pub seats: Vec<String>,
    pub notes: Option<String>,
    pub reminder_sent_at: Option<DateTime<Utc>>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Reservation> for ReservationResponse {
    fn from(value: Reservation) -> Self {
        let Reservation {
            reservation_id,
            reserved_by,
            kind,
            window,
            status,
            seats,
            notes,
            reminder_sent_at,
            confirmed_at,
            cancelled_at,
            created_at,
        } = value;
        Self {
            id: reservation_id,
            user_id: reserved_by,
            reservation_type: kind.into(),
            start_time: window.start,
            end_time: window.end,
            status: status.to_string(),
            seats,
            notes,
            reminder_sent_at,
            confirmed_at,
            cancelled_at,
            created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepResponse {
    pub reminders_set: usize,
    pub expired: usize,
}

impl From<SweepReport> for SweepResponse {
    fn from(value: SweepReport) -> Self {
        let SweepReport {
            reminders_set,
            expired,
        } = value;
        Self {
            reminders_set,
            expired,
        }
    }
}
