use crate::domain::{models::notification::Notification, ports::NotificationRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

pub struct SqliteNotificationRepo {
    pool: SqlitePool,
}

impl SqliteNotificationRepo {
    pub fn new(pool: SqlitePool) -> Self { Self { pool } }
}

#[async_trait]
impl NotificationRepository for SqliteNotificationRepo {
    async fn create(&self, notification: &Notification) -> Result<Notification, AppError> {
        sqlx::query_as::<_, Notification>(
            "INSERT INTO notifications (id, user_id, session_id, title, message, kind, status, delivery_claimed_at, sent_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING *"
        )
            .bind(&notification.id)
            .bind(&notification.user_id)
            .bind(&notification.session_id)
            .bind(&notification.title)
            .bind(&notification.message)
            .bind(notification.kind.as_str())
            .bind(notification.status.as_str())
            .bind(notification.delivery_claimed_at)
            .bind(notification.sent_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Notification>, AppError> {
        sqlx::query_as::<_, Notification>("SELECT * FROM notifications WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Notification>, AppError> {
        sqlx::query_as::<_, Notification>("SELECT * FROM notifications WHERE user_id = ? ORDER BY sent_at DESC, id DESC")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn mark_read(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE notifications SET status = 'READ' WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Notificación no encontrada".into()));
        }
        Ok(())
    }

    async fn mark_all_read(&self, user_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query("UPDATE notifications SET status = 'READ' WHERE user_id = ? AND status != 'READ'")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }

    async fn claim_undelivered(&self, limit: i64, stale_before: DateTime<Utc>) -> Result<Vec<Notification>, AppError> {
        sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notifications SET delivery_claimed_at = ?
            WHERE id IN (
                SELECT id FROM notifications
                WHERE kind = 'IN_APP' AND (delivery_claimed_at IS NULL OR delivery_claimed_at < ?)
                ORDER BY COALESCE(delivery_claimed_at, sent_at) ASC
                LIMIT ?
            )
            RETURNING *
            "#
        )
            .bind(Utc::now())
            .bind(stale_before)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn mark_emailed(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE notifications SET kind = 'EMAIL', status = CASE WHEN status = 'PENDING' THEN 'SENT' ELSE status END WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }
}
