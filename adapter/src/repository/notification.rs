use crate::database::{model::notification::NotificationRow, ConnectionPool};
use async_trait::async_trait;
use derive_new::new;
use kernel::model::{
    id::{NotificationId, UserId},
    notification::{CreateNotification, Notification, NotificationList},
};
use kernel::repository::notification::{NotificationRepository, NotificationSink};
use shared::error::{AppError, AppResult};

// 通知を notifications テーブルに記録する。配送は別の仕組みがこのテーブルを読む
#[derive(new)]
pub struct NotificationRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl NotificationSink for NotificationRepositoryImpl {
    async fn notify(&self, event: CreateNotification) -> AppResult<()> {
        let res = sqlx::query(
            r#"
                INSERT INTO notifications
                (notification_id, user_id, title, message, category, related_id)
                VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(NotificationId::new().raw())
        .bind(event.user_id.raw())
        .bind(&event.title)
        .bind(&event.message)
        .bind(event.category.to_string())
        .bind(event.related_id.map(|id| id.raw()))
        .execute(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(AppError::NoRowsAffectedError(
                "No notification record has been created".into(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationRepository for NotificationRepositoryImpl {
    async fn find_by_user_id(&self, user_id: UserId, limit: i64) -> AppResult<NotificationList> {
        let items = sqlx::query_as::<_, NotificationRow>(
            r#"
                SELECT
                notification_id,
                user_id,
                title,
                message,
                category,
                is_read,
                related_id,
                created_at
                FROM notifications
                WHERE user_id = $1
                ORDER BY created_at DESC
                LIMIT $2
            "#,
        )
        .bind(user_id.raw())
        .bind(limit)
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?
        .into_iter()
        .map(Notification::try_from)
        .collect::<AppResult<Vec<_>>>()?;

        let unread_count: i64 = sqlx::query_scalar(
            r#"
                SELECT COUNT(*) FROM notifications
                WHERE user_id = $1 AND is_read = FALSE
            "#,
        )
        .bind(user_id.raw())
        .fetch_one(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(NotificationList {
            items,
            unread_count,
        })
    }

    async fn mark_read(&self, notification_id: NotificationId, user_id: UserId) -> AppResult<()> {
        let res = sqlx::query(
            r#"
                UPDATE notifications
                SET is_read = TRUE
                WHERE notification_id = $1 AND user_id = $2
            "#,
        )
        .bind(notification_id.raw())
        .bind(user_id.raw())
        .execute(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(AppError::EntityNotFound("Notification not found".into()));
        }
        Ok(())
    }

    async fn mark_all_read(&self, user_id: UserId) -> AppResult<u64> {
        sqlx::query(
            r#"
                UPDATE notifications
                SET is_read = TRUE
                WHERE user_id = $1 AND is_read = FALSE
            "#,
        )
        .bind(user_id.raw())
        .execute(self.db.inner_ref())
        .await
        .map(|res| res.rows_affected())
        .map_err(AppError::SpecificOperationError)
    }
}
