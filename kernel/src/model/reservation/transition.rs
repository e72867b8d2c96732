//! 予約ステータスの遷移表
//!
//! ```text
//! Active ──confirm──▶ Confirmed
//!   │ │                  │
//!   │ └──cancel──▶ Cancelled ◀──cancel──┘
//!   ├──remind──▶ Active
//!   └──expire──▶ Expired
//! ```

use crate::model::reservation::ReservationStatus;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationTransition {
    Confirm,
    Cancel,
    Remind,
    Expire,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Reservation is cancelled")]
    Cancelled,
    #[error("Reservation has expired")]
    Expired,
    #[error("Reservation is already confirmed")]
    AlreadyConfirmed,
    #[error("Cannot {transition:?} a reservation in status {from}")]
    NotAllowed {
        transition: ReservationTransition,
        from: ReservationStatus,
    },
}

impl ReservationTransition {
    /// この遷移を受け付ける元ステータス。ストア側の更新条件にもそのまま使う
    pub fn allowed_from(self) -> &'static [ReservationStatus] {
        match self {
            ReservationTransition::Confirm
            | ReservationTransition::Remind
            | ReservationTransition::Expire => &[ReservationStatus::Active],
            ReservationTransition::Cancel => &ReservationStatus::LIVE,
        }
    }

    pub fn target(self) -> ReservationStatus {
        match self {
            ReservationTransition::Confirm => ReservationStatus::Confirmed,
            ReservationTransition::Cancel => ReservationStatus::Cancelled,
            ReservationTransition::Remind => ReservationStatus::Active,
            ReservationTransition::Expire => ReservationStatus::Expired,
        }
    }

    pub fn allowed_from_names(self) -> Vec<String> {
        self.allowed_from()
            .iter()
            .map(ToString::to_string)
            .collect()
    }
}

impl ReservationStatus {
    pub fn transition(
        self,
        transition: ReservationTransition,
    ) -> Result<ReservationStatus, TransitionError> {
        if !transition.allowed_from().contains(&self) {
            return Err(match (self, transition) {
                (ReservationStatus::Cancelled, _) => TransitionError::Cancelled,
                (ReservationStatus::Expired, _) => TransitionError::Expired,
                (ReservationStatus::Confirmed, ReservationTransition::Confirm) => {
                    TransitionError::AlreadyConfirmed
                }
                (from, transition) => TransitionError::NotAllowed { transition, from },
            });
        }
        Ok(transition.target())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ReservationStatus::*;
    use ReservationTransition::*;

    #[test]
    fn legal_transitions() {
        assert_eq!(Active.transition(Confirm), Ok(Confirmed));
        assert_eq!(Active.transition(Cancel), Ok(Cancelled));
        assert_eq!(Confirmed.transition(Cancel), Ok(Cancelled));
        assert_eq!(Active.transition(Remind), Ok(Active));
        assert_eq!(Active.transition(Expire), Ok(Expired));
    }

    #[test]
    fn terminal_states_never_move() {
        for from in [Cancelled, Expired] {
            for t in [Confirm, Cancel, Remind, Expire] {
                assert!(from.transition(t).is_err(), "{from} accepted {t:?}");
            }
        }
        assert_eq!(Cancelled.transition(Cancel), Err(TransitionError::Cancelled));
        assert_eq!(Expired.transition(Confirm), Err(TransitionError::Expired));
    }

    #[test]
    fn confirmed_cannot_be_confirmed_again_or_swept() {
        assert_eq!(Confirmed.transition(Confirm), Err(TransitionError::AlreadyConfirmed));
        assert!(matches!(
            Confirmed.transition(Expire),
            Err(TransitionError::NotAllowed { .. })
        ));
        assert!(Confirmed.transition(Remind).is_err());
    }
}
