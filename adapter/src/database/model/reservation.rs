use kernel::model::reservation::{
    index::SeatBooking, Reservation, ReservationKind, ReservationStatus, TimeWindow,
};
use shared::error::{AppError, AppResult};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

// reservations テーブルの 1 行。座席は別テーブルから集めて into_reservation で合わせる
#[derive(sqlx::FromRow)]
pub struct ReservationRow {
    pub reservation_id: Uuid,
    pub user_id: Uuid,
    pub reservation_type: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: String,
    pub reminder_sent_at: Option<DateTime<Utc>>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ReservationRow {
    pub fn into_reservation(self, seats: Vec<String>) -> AppResult<Reservation> {
        let ReservationRow {
            reservation_id,
            user_id,
            reservation_type,
            start_time,
            end_time,
            status,
            reminder_sent_at,
            confirmed_at,
            cancelled_at,
            notes,
            created_at,
        } = self;
        Ok(Reservation {
            reservation_id: reservation_id.into(),
            reserved_by: user_id.into(),
            kind: parse_kind(&reservation_type)?,
            window: TimeWindow::new(start_time, end_time),
            status: parse_status(&status)?,
            seats,
            notes,
            reminder_sent_at,
            confirmed_at,
            cancelled_at,
            created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub struct ReservationSeatRow {
    pub reservation_id: Uuid,
    pub seat_id: String,
}

// 空席判定用に、座席ごとに予約の時間帯とステータスを持つ型
#[derive(sqlx::FromRow)]
pub struct SeatBookingRow {
    pub seat_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: String,
}

impl TryFrom<SeatBookingRow> for SeatBooking {
    type Error = AppError;

    fn try_from(value: SeatBookingRow) -> Result<Self, Self::Error> {
        let SeatBookingRow {
            seat_id,
            start_time,
            end_time,
            status,
        } = value;
        Ok(SeatBooking::new(
            seat_id,
            TimeWindow::new(start_time, end_time),
            parse_status(&status)?,
        ))
    }
}

fn parse_kind(value: &str) -> AppResult<ReservationKind> {
    value
        .parse()
        .map_err(|_| {
            AppError::ConversionEntityError(format!("unknown reservation type: {value}"))
        })
}

fn parse_status(value: &str) -> AppResult<ReservationStatus> {
    value
        .parse()
        .map_err(|_| {
            AppError::ConversionEntityError(format!("unknown reservation status: {value}"))
        })
}
