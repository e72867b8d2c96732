use crate::model::{
    id::{ReservationId, UserId},
    reservation::{
        event::{CancelReservation, ConfirmReservation, CreateReservation},
        Reservation, SweepReport, TimeWindow,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::error::AppResult;
use std::collections::BTreeSet;

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    // 検証・空席確認・登録をひとまとまりで行い、作成した予約を返す
    async fn create(&self, event: CreateReservation) -> AppResult<Reservation>;
    // 予約者本人による確定
    async fn confirm(&self, event: ConfirmReservation) -> AppResult<Reservation>;
    // 予約者本人、または権限を持つ利用者によるキャンセル
    async fn cancel(&self, event: CancelReservation) -> AppResult<Reservation>;
    async fn find_by_id(&self, reservation_id: ReservationId) -> AppResult<Option<Reservation>>;
    // ユーザー ID に紐づく予約を開始時刻の新しい順に取得する
    async fn find_by_user_id(&self, user_id: UserId) -> AppResult<Vec<Reservation>>;
    // すべての予約を開始時刻の新しい順に取得する
    async fn find_all(&self) -> AppResult<Vec<Reservation>>;
    // 指定時間帯に埋まっている座席
    async fn find_occupied_seats(&self, window: TimeWindow) -> AppResult<BTreeSet<String>>;
    // リマインダー送信と期限切れ処理を 1 回分実行する
    async fn sweep(&self, now: DateTime<Utc>) -> AppResult<SweepReport>;
}
