use crate::{
    extractor::{AppPath, AuthorizedUser},
    model::{notification::NotificationsResponse, reservation::MessageResponse},
};
use axum::{extract::State, Json};
use kernel::model::id::NotificationId;
use registry::AppRegistry;
use shared::error::AppResult;

// 一覧で返す通知の最大件数
const NOTIFICATION_PAGE_SIZE: i64 = 50;

pub async fn show_my_notifications(
    user: AuthorizedUser,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<NotificationsResponse>> {
    registry
        .notification_repository()
        .find_by_user_id(user.id(), NOTIFICATION_PAGE_SIZE)
        .await
        .map(NotificationsResponse::from)
        .map(Json)
}

pub async fn mark_notification_read(
    user: AuthorizedUser,
    AppPath(notification_id): AppPath<NotificationId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<MessageResponse>> {
    registry
        .notification_repository()
        .mark_read(notification_id, user.id())
        .await
        .map(|_| Json(MessageResponse::new("Marked as read")))
}

pub async fn mark_all_notifications_read(
    user: AuthorizedUser,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<MessageResponse>> {
    registry
        .notification_repository()
        .mark_all_read(user.id())
        .await
        .map(|n| Json(MessageResponse::new(format!("Marked {n} notifications as read"))))
}
