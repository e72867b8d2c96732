use crate::model::id::{ReservationId, UserId};
use chrono::{DateTime, Duration, Utc};
use derive_new::new;
use strum::{Display, EnumString};

pub mod event;
pub mod index;
pub mod policy;
pub mod transition;

/// 開始何分前からリマインダーを送るか
pub const REMINDER_LEAD_MINUTES: i64 = 15;

pub fn reminder_lead() -> Duration {
    Duration::minutes(REMINDER_LEAD_MINUTES)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ReservationKind {
    Solo,
    Group,
}

impl ReservationKind {
    pub fn max_duration(self) -> Duration {
        match self {
            ReservationKind::Solo => Duration::hours(3),
            ReservationKind::Group => Duration::hours(2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
pub enum ReservationStatus {
    Active,
    Confirmed,
    Cancelled,
    Expired,
}

impl ReservationStatus {
    pub const LIVE: [ReservationStatus; 2] =
        [ReservationStatus::Active, ReservationStatus::Confirmed];

    pub fn is_terminal(self) -> bool {
        matches!(self, ReservationStatus::Cancelled | ReservationStatus::Expired)
    }
}

/// 半開区間 [start, end)
#[derive(Debug, Clone, Copy, PartialEq, Eq, new)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && self.end > other.start
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub reservation_id: ReservationId,
    pub reserved_by: UserId,
    pub kind: ReservationKind,
    pub window: TimeWindow,
    pub status: ReservationStatus,
    pub seats: Vec<String>,
    pub notes: Option<String>,
    pub reminder_sent_at: Option<DateTime<Utc>>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    pub fn is_live(&self) -> bool {
        !self.status.is_terminal()
    }

    pub fn needs_reminder(&self, now: DateTime<Utc>) -> bool {
        self.status == ReservationStatus::Active
            && self.reminder_sent_at.is_none()
            && now < self.window.start
            && self.window.start <= now + reminder_lead()
    }

    pub fn is_expirable(&self, now: DateTime<Utc>) -> bool {
        self.status == ReservationStatus::Active
            && self.window.start <= now
            && self.reminder_sent_at.is_some()
    }
}

/// スイープ 1 回分の結果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub reminders_set: usize,
    pub expired: usize,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.reminders_set == 0 && self.expired == 0
    }
}
