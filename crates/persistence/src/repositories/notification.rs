//! Notification repository.

use sqlx::PgPool;

use domain::models::NewNotification;
use domain::services::{NotificationStore, StoreError};

use super::store_err;

/// Repository for the notifications table. The engine only inserts;
/// reading and the read-flag belong to the inbox API.
#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl NotificationStore for NotificationRepository {
    async fn insert(&self, notification: &NewNotification) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO notifications (user_id, vendor_id, kind, title, body, image, data)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(notification.user_id)
        .bind(notification.vendor_id)
        .bind(notification.kind.as_str())
        .bind(&notification.title)
        .bind(&notification.body)
        .bind(&notification.image)
        .bind(&notification.data)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(())
    }
}
