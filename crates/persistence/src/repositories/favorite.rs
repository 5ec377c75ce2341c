//! Favorite-vendor relationship lookups.

use sqlx::PgPool;
use uuid::Uuid;

use domain::services::{FavoriteIndex, StoreError};

use super::store_err;

#[derive(Clone)]
pub struct FavoriteRepository {
    pool: PgPool,
}

impl FavoriteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl FavoriteIndex for FavoriteRepository {
    /// Users who have favorited the given vendor.
    async fn user_ids_for_vendor(&self, vendor_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM favorite_vendors WHERE vendor_id = $1",
        )
        .bind(vendor_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)
    }

    /// Vendors the given user has favorited.
    async fn vendor_ids_for_user(&self, user_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT vendor_id FROM favorite_vendors WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)
    }
}
