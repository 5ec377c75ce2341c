//! Read seams for the account, favorite, and vendor registries.
//!
//! The engine never writes these tables; it only needs eligible subscriber
//! populations, favorite relationships, and vendor metadata. Traits keep the
//! poller and the on-demand triggers testable without a database.

use std::collections::HashMap;
use std::sync::Mutex;

use uuid::Uuid;

use crate::models::{Position, Subscriber, SubscriberAccount};
use crate::services::StoreError;

/// Read access to subscriber accounts, pre-filtered to eligible populations.
#[async_trait::async_trait]
pub trait SubscriberDirectory: Send + Sync {
    /// Subscribers with the distance-based alert on and a known position.
    async fn distance_alert_subscribers(&self) -> Result<Vec<Subscriber>, StoreError>;

    /// Subscribers with the new-vendor alert on and a known position.
    async fn new_vendor_alert_subscribers(&self) -> Result<Vec<Subscriber>, StoreError>;

    /// The subset of the given users with the favorite-vendor alert on and a
    /// known position. Used with a vendor's favoriter list.
    async fn favorite_alert_subscribers(
        &self,
        user_ids: &[Uuid],
    ) -> Result<Vec<Subscriber>, StoreError>;

    /// The subset of the given users with the favorite-vendor alert on,
    /// regardless of position. For non-geographic fan-outs.
    async fn favorite_alert_recipients(
        &self,
        user_ids: &[Uuid],
    ) -> Result<Vec<Subscriber>, StoreError>;

    /// Full account view for one user.
    async fn account(&self, user_id: Uuid) -> Result<Option<SubscriberAccount>, StoreError>;
}

/// Read access to the user↔vendor favorite relation.
#[async_trait::async_trait]
pub trait FavoriteIndex: Send + Sync {
    async fn user_ids_for_vendor(&self, vendor_id: Uuid) -> Result<Vec<Uuid>, StoreError>;

    async fn vendor_ids_for_user(&self, user_id: Uuid) -> Result<Vec<Uuid>, StoreError>;
}

/// Read access to vendor metadata.
#[async_trait::async_trait]
pub trait VendorDirectory: Send + Sync {
    /// Display names for a set of vendors. Vendors with no row are absent
    /// from the map; callers fall back to a generic label.
    async fn names_by_ids(
        &self,
        vendor_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, String>, StoreError>;

    /// The vendor's registered fixed stall position, if one is on record.
    async fn fixed_position(&self, vendor_id: Uuid) -> Result<Option<Position>, StoreError>;
}

/// In-memory subscriber directory, for tests and development.
#[derive(Debug, Default)]
pub struct MemorySubscriberDirectory {
    accounts: Mutex<HashMap<Uuid, SubscriberAccount>>,
}

impl MemorySubscriberDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, account: SubscriberAccount) {
        self.accounts.lock().unwrap().insert(account.user_id, account);
    }

    fn collect<F>(&self, keep: F) -> Vec<Subscriber>
    where
        F: Fn(&SubscriberAccount) -> bool,
    {
        self.accounts
            .lock()
            .unwrap()
            .values()
            .filter(|a| keep(a))
            .map(SubscriberAccount::as_subscriber)
            .collect()
    }
}

#[async_trait::async_trait]
impl SubscriberDirectory for MemorySubscriberDirectory {
    async fn distance_alert_subscribers(&self) -> Result<Vec<Subscriber>, StoreError> {
        Ok(self.collect(|a| a.distance_based_alert && a.position.is_some()))
    }

    async fn new_vendor_alert_subscribers(&self) -> Result<Vec<Subscriber>, StoreError> {
        Ok(self.collect(|a| a.new_vendor_alert && a.position.is_some()))
    }

    async fn favorite_alert_subscribers(
        &self,
        user_ids: &[Uuid],
    ) -> Result<Vec<Subscriber>, StoreError> {
        Ok(self.collect(|a| {
            user_ids.contains(&a.user_id) && a.favorite_vendor_alert && a.position.is_some()
        }))
    }

    async fn favorite_alert_recipients(
        &self,
        user_ids: &[Uuid],
    ) -> Result<Vec<Subscriber>, StoreError> {
        Ok(self.collect(|a| user_ids.contains(&a.user_id) && a.favorite_vendor_alert))
    }

    async fn account(&self, user_id: Uuid) -> Result<Option<SubscriberAccount>, StoreError> {
        Ok(self.accounts.lock().unwrap().get(&user_id).cloned())
    }
}

/// In-memory favorite relation, for tests and development.
#[derive(Debug, Default)]
pub struct MemoryFavoriteIndex {
    pairs: Mutex<Vec<(Uuid, Uuid)>>,
}

impl MemoryFavoriteIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, user_id: Uuid, vendor_id: Uuid) {
        self.pairs.lock().unwrap().push((user_id, vendor_id));
    }
}

#[async_trait::async_trait]
impl FavoriteIndex for MemoryFavoriteIndex {
    async fn user_ids_for_vendor(&self, vendor_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        Ok(self
            .pairs
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, v)| *v == vendor_id)
            .map(|(u, _)| *u)
            .collect())
    }

    async fn vendor_ids_for_user(&self, user_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        Ok(self
            .pairs
            .lock()
            .unwrap()
            .iter()
            .filter(|(u, _)| *u == user_id)
            .map(|(_, v)| *v)
            .collect())
    }
}

/// In-memory vendor registry, for tests and development.
#[derive(Debug, Default)]
pub struct MemoryVendorDirectory {
    names: Mutex<HashMap<Uuid, String>>,
    fixed: Mutex<HashMap<Uuid, Position>>,
}

impl MemoryVendorDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_name(&self, vendor_id: Uuid, name: &str) {
        self.names.lock().unwrap().insert(vendor_id, name.to_string());
    }

    pub fn set_fixed_position(&self, vendor_id: Uuid, position: Position) {
        self.fixed.lock().unwrap().insert(vendor_id, position);
    }
}

#[async_trait::async_trait]
impl VendorDirectory for MemoryVendorDirectory {
    async fn names_by_ids(
        &self,
        vendor_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, String>, StoreError> {
        let names = self.names.lock().unwrap();
        Ok(vendor_ids
            .iter()
            .filter_map(|id| names.get(id).map(|n| (*id, n.clone())))
            .collect())
    }

    async fn fixed_position(&self, vendor_id: Uuid) -> Result<Option<Position>, StoreError> {
        Ok(self.fixed.lock().unwrap().get(&vendor_id).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(position: Option<Position>, favorite: bool) -> SubscriberAccount {
        SubscriberAccount {
            user_id: Uuid::new_v4(),
            position,
            device_tokens: vec!["tok".into()],
            distance_based_alert: true,
            favorite_vendor_alert: favorite,
            new_vendor_alert: false,
        }
    }

    #[tokio::test]
    async fn test_population_excludes_missing_position() {
        let directory = MemorySubscriberDirectory::new();
        directory.insert(account(Position::new(1.0, 1.0), false));
        directory.insert(account(None, false));

        let population = directory.distance_alert_subscribers().await.unwrap();
        assert_eq!(population.len(), 1);
    }

    #[tokio::test]
    async fn test_recipients_ignore_position_but_honor_flag() {
        let directory = MemorySubscriberDirectory::new();
        let with_flag = account(None, true);
        let without_flag = account(Position::new(1.0, 1.0), false);
        let ids = vec![with_flag.user_id, without_flag.user_id];
        directory.insert(with_flag);
        directory.insert(without_flag);

        let recipients = directory.favorite_alert_recipients(&ids).await.unwrap();
        assert_eq!(recipients.len(), 1);
    }

    #[tokio::test]
    async fn test_favorite_index_is_directional() {
        let index = MemoryFavoriteIndex::new();
        let (user, vendor) = (Uuid::new_v4(), Uuid::new_v4());
        index.add(user, vendor);

        assert_eq!(index.user_ids_for_vendor(vendor).await.unwrap(), vec![user]);
        assert_eq!(index.vendor_ids_for_user(user).await.unwrap(), vec![vendor]);
        assert!(index
            .user_ids_for_vendor(Uuid::new_v4())
            .await
            .unwrap()
            .is_empty());
    }
}
