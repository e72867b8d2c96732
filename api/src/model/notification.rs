use chrono::{DateTime, Utc};
use kernel::model::{
    id::{NotificationId, ReservationId},
    notification::{Notification, NotificationList},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationsResponse {
    pub notifications: Vec<NotificationResponse>,
    pub unread_count: i64,
}

impl From<NotificationList> for NotificationsResponse {
    fn from(value: NotificationList) -> Self {
        let NotificationList {
            items,
            unread_count,
        } = value;
        Self {
            notifications: items.into_iter().map(NotificationResponse::from).collect(),
            unread_count,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: NotificationId,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub category: String,
    pub is_read: bool,
    pub related_id: Option<ReservationId>,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationResponse {
    fn from(value: Notification) -> Self {
        let Notification {
            notification_id,
            user_id: _,
            title,
            message,
            category,
            is_read,
            related_id,
            created_at,
        } = value;
        Self {
            id: notification_id,
            title,
            message,
            category: category.to_string(),
            is_read,
            related_id,
            created_at,
        }
    }
}
