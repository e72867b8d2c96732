use crate::model::{
    id::{NotificationId, UserId},
    notification::{CreateNotification, NotificationList},
};
use async_trait::async_trait;
use shared::error::AppResult;

/// 通知の受け口。配送手段には依存しない
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, event: CreateNotification) -> AppResult<()>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    // ユーザーの新しい通知から最大 limit 件と未読件数を取得する
    async fn find_by_user_id(&self, user_id: UserId, limit: i64) -> AppResult<NotificationList>;
    // 既読にする。本人の通知でなければ EntityNotFound
    async fn mark_read(&self, notification_id: NotificationId, user_id: UserId) -> AppResult<()>;
    // 未読をすべて既読にし、更新件数を返す
    async fn mark_all_read(&self, user_id: UserId) -> AppResult<u64>;
}
