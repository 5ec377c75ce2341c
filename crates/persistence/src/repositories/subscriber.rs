//! Subscriber (user) read repository.

use sqlx::PgPool;
use uuid::Uuid;

use domain::models::{Subscriber, SubscriberAccount};
use domain::services::{StoreError, SubscriberDirectory};

use crate::entities::{SubscriberAccountEntity, SubscriberEntity};

use super::store_err;

/// Read-only access to the users table for the engine: alert populations
/// and single-account lookups. Queries pre-filter on the preference flag and
/// on non-null coordinates, so the engine never sees ineligible subscribers.
#[derive(Clone)]
pub struct SubscriberRepository {
    pool: PgPool,
}

impl SubscriberRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_population(&self, sql: &str) -> Result<Vec<Subscriber>, StoreError> {
        let entities = sqlx::query_as::<_, SubscriberEntity>(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(store_err)?;

        Ok(entities.into_iter().map(Into::into).collect())
    }

    async fn fetch_among(
        &self,
        sql: &str,
        user_ids: &[Uuid],
    ) -> Result<Vec<Subscriber>, StoreError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let entities = sqlx::query_as::<_, SubscriberEntity>(sql)
            .bind(user_ids)
            .fetch_all(&self.pool)
            .await
            .map_err(store_err)?;

        Ok(entities.into_iter().map(Into::into).collect())
    }
}

#[async_trait::async_trait]
impl SubscriberDirectory for SubscriberRepository {
    async fn distance_alert_subscribers(&self) -> Result<Vec<Subscriber>, StoreError> {
        self.fetch_population(
            r#"
            SELECT id, lat, lng, fcm_device_tokens FROM users
            WHERE distance_based_alert = TRUE AND lat IS NOT NULL AND lng IS NOT NULL
            "#,
        )
        .await
    }

    async fn new_vendor_alert_subscribers(&self) -> Result<Vec<Subscriber>, StoreError> {
        self.fetch_population(
            r#"
            SELECT id, lat, lng, fcm_device_tokens FROM users
            WHERE new_vendor_alert = TRUE AND lat IS NOT NULL AND lng IS NOT NULL
            "#,
        )
        .await
    }

    async fn favorite_alert_subscribers(
        &self,
        user_ids: &[Uuid],
    ) -> Result<Vec<Subscriber>, StoreError> {
        self.fetch_among(
            r#"
            SELECT id, lat, lng, fcm_device_tokens FROM users
            WHERE id = ANY($1)
              AND favorite_vendor_alert = TRUE
              AND lat IS NOT NULL AND lng IS NOT NULL
            "#,
            user_ids,
        )
        .await
    }

    async fn favorite_alert_recipients(
        &self,
        user_ids: &[Uuid],
    ) -> Result<Vec<Subscriber>, StoreError> {
        self.fetch_among(
            r#"
            SELECT id, lat, lng, fcm_device_tokens FROM users
            WHERE id = ANY($1) AND favorite_vendor_alert = TRUE
            "#,
            user_ids,
        )
        .await
    }

    async fn account(&self, user_id: Uuid) -> Result<Option<SubscriberAccount>, StoreError> {
        let entity = sqlx::query_as::<_, SubscriberAccountEntity>(
            r#"
            SELECT id, lat, lng, fcm_device_tokens,
                   distance_based_alert, favorite_vendor_alert, new_vendor_alert
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(entity.map(Into::into))
    }
}
