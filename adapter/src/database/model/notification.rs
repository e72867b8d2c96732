use kernel::model::notification::Notification;
use shared::error::{AppError, AppResult};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(sqlx::FromRow)]
pub struct NotificationRow {
    pub notification_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub category: String,
    pub is_read: bool,
    pub related_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = AppError;

    fn try_from(value: NotificationRow) -> AppResult<Self> {
        let NotificationRow {
            notification_id,
            user_id,
            title,
            message,
            category,
            is_read,
            related_id,
            created_at,
        } = value;
        Ok(Notification {
            notification_id: notification_id.into(),
            user_id: user_id.into(),
            title,
            message,
            category: category.parse().map_err(|_| {
                AppError::ConversionEntityError(format!(
                    "unknown notification category: {category}"
                ))
            })?,
            is_read,
            related_id: related_id.map(Into::into),
            created_at,
        })
    }
}
