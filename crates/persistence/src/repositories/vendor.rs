//! Vendor metadata lookups.

use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use domain::models::Position;
use domain::services::{StoreError, VendorDirectory};

use super::store_err;

#[derive(Clone)]
pub struct VendorRepository {
    pool: PgPool,
}

impl VendorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl VendorDirectory for VendorRepository {
    async fn names_by_ids(
        &self,
        vendor_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, String>, StoreError> {
        if vendor_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT id, name FROM vendors WHERE id = ANY($1)",
        )
        .bind(vendor_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(rows.into_iter().collect())
    }

    /// Used as a fallback when no live coordinates accompany an update.
    async fn fixed_position(&self, vendor_id: Uuid) -> Result<Option<Position>, StoreError> {
        let row = sqlx::query_as::<_, (Option<f64>, Option<f64>)>(
            "SELECT fixed_lat, fixed_lng FROM vendor_locations WHERE vendor_id = $1",
        )
        .bind(vendor_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(row.and_then(|(lat, lng)| Position::from_parts(lat, lng)))
    }
}
