//! Proximity state repository.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use domain::models::AlertKind;
use domain::services::{ProximityStateStore, StateChange, StoreError};

use super::store_err;

/// Repository for the proximity_records table. Write-mostly: the engine
/// reads nothing but the inside/outside flag.
#[derive(Clone)]
pub struct ProximityStateRepository {
    pool: PgPool,
}

impl ProximityStateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ProximityStateStore for ProximityStateRepository {
    async fn was_inside(
        &self,
        user_id: Uuid,
        vendor_id: Uuid,
        kind: AlertKind,
    ) -> Result<bool, StoreError> {
        let inside: Option<(bool,)> = sqlx::query_as(
            r#"
            SELECT inside_radius FROM proximity_records
            WHERE user_id = $1 AND vendor_id = $2 AND alert_kind = $3
            "#,
        )
        .bind(user_id)
        .bind(vendor_id)
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(inside.map(|(b,)| b).unwrap_or(false))
    }

    async fn bulk_lookup(
        &self,
        vendor_id: Uuid,
        kind: AlertKind,
        user_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, bool>, StoreError> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(Uuid, bool)> = sqlx::query_as(
            r#"
            SELECT user_id, inside_radius FROM proximity_records
            WHERE vendor_id = $1 AND alert_kind = $2 AND user_id = ANY($3)
            "#,
        )
        .bind(vendor_id)
        .bind(kind.as_str())
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(rows.into_iter().collect())
    }

    async fn bulk_upsert(&self, changes: &[StateChange]) -> Result<(), StoreError> {
        if changes.is_empty() {
            return Ok(());
        }

        let user_ids: Vec<Uuid> = changes.iter().map(|c| c.user_id).collect();
        let vendor_ids: Vec<Uuid> = changes.iter().map(|c| c.vendor_id).collect();
        let kinds: Vec<String> = changes.iter().map(|c| c.kind.as_str().to_string()).collect();
        let inside: Vec<bool> = changes.iter().map(|c| c.inside_radius).collect();
        let notified: Vec<Option<DateTime<Utc>>> = changes.iter().map(|c| c.notified_at).collect();

        // Idempotent last-write-wins upsert; an EXIT carries no timestamp
        // and must not clobber the stored last_notified_at.
        sqlx::query(
            r#"
            INSERT INTO proximity_records (user_id, vendor_id, alert_kind, inside_radius, last_notified_at)
            SELECT * FROM UNNEST($1::uuid[], $2::uuid[], $3::text[], $4::bool[], $5::timestamptz[])
            ON CONFLICT (user_id, vendor_id, alert_kind)
            DO UPDATE SET
                inside_radius = EXCLUDED.inside_radius,
                last_notified_at = COALESCE(EXCLUDED.last_notified_at, proximity_records.last_notified_at),
                updated_at = NOW()
            "#,
        )
        .bind(&user_ids)
        .bind(&vendor_ids)
        .bind(&kinds)
        .bind(&inside)
        .bind(&notified)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(())
    }
}
