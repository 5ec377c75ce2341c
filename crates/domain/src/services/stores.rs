//! Persistence seams for proximity state and notification records.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{AlertKind, NewNotification, ProximityRecord};

/// Storage failure, opaque to the engine. The engine only ever logs these
/// and retries at the next natural trigger.
#[derive(Debug, thiserror::Error)]
#[error("storage error: {0}")]
pub struct StoreError(pub String);

/// One state flip to persist: the result of an ENTER or EXIT transition.
#[derive(Debug, Clone)]
pub struct StateChange {
    pub user_id: Uuid,
    pub vendor_id: Uuid,
    pub kind: AlertKind,
    pub inside_radius: bool,
    /// Set on ENTER only; EXIT leaves the stored timestamp untouched.
    pub notified_at: Option<DateTime<Utc>>,
}

/// Store of per-(user, vendor, kind) inside/outside state.
///
/// Absence of a record reads as "outside". Upserts are idempotent and
/// last-write-wins under concurrent writers (accepted race, see the poller
/// docs). Batch variants exist because the poller evaluates many pairs per
/// cycle.
#[async_trait::async_trait]
pub trait ProximityStateStore: Send + Sync {
    async fn was_inside(
        &self,
        user_id: Uuid,
        vendor_id: Uuid,
        kind: AlertKind,
    ) -> Result<bool, StoreError>;

    /// Stored state for many users against one vendor. Users without a
    /// record are simply absent from the map.
    async fn bulk_lookup(
        &self,
        vendor_id: Uuid,
        kind: AlertKind,
        user_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, bool>, StoreError>;

    async fn bulk_upsert(&self, changes: &[StateChange]) -> Result<(), StoreError>;
}

/// Store of immutable notification records.
#[async_trait::async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert(&self, notification: &NewNotification) -> Result<(), StoreError>;
}

/// In-memory proximity state, for tests and development.
#[derive(Debug, Default)]
pub struct MemoryProximityState {
    records: Mutex<HashMap<(Uuid, Uuid, AlertKind), ProximityRecord>>,
}

impl MemoryProximityState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full stored record for a key, if any.
    pub fn record(
        &self,
        user_id: Uuid,
        vendor_id: Uuid,
        kind: AlertKind,
    ) -> Option<ProximityRecord> {
        self.records
            .lock()
            .unwrap()
            .get(&(user_id, vendor_id, kind))
            .cloned()
    }

    /// Stored notified-at timestamp for a key, if any.
    pub fn last_notified_at(
        &self,
        user_id: Uuid,
        vendor_id: Uuid,
        kind: AlertKind,
    ) -> Option<DateTime<Utc>> {
        self.record(user_id, vendor_id, kind)
            .and_then(|r| r.last_notified_at)
    }

    pub fn record_count(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl ProximityStateStore for MemoryProximityState {
    async fn was_inside(
        &self,
        user_id: Uuid,
        vendor_id: Uuid,
        kind: AlertKind,
    ) -> Result<bool, StoreError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(&(user_id, vendor_id, kind))
            .map(|r| r.inside_radius)
            .unwrap_or(false))
    }

    async fn bulk_lookup(
        &self,
        vendor_id: Uuid,
        kind: AlertKind,
        user_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, bool>, StoreError> {
        let records = self.records.lock().unwrap();
        Ok(user_ids
            .iter()
            .filter_map(|user_id| {
                records
                    .get(&(*user_id, vendor_id, kind))
                    .map(|r| (*user_id, r.inside_radius))
            })
            .collect())
    }

    async fn bulk_upsert(&self, changes: &[StateChange]) -> Result<(), StoreError> {
        let mut records = self.records.lock().unwrap();
        for change in changes {
            let key = (change.user_id, change.vendor_id, change.kind);
            let prior_notified = records.get(&key).and_then(|r| r.last_notified_at);
            records.insert(
                key,
                ProximityRecord {
                    user_id: change.user_id,
                    vendor_id: change.vendor_id,
                    kind: change.kind,
                    inside_radius: change.inside_radius,
                    last_notified_at: change.notified_at.or(prior_notified),
                    updated_at: Utc::now(),
                },
            );
        }
        Ok(())
    }
}

/// In-memory notification store, for tests and development.
#[derive(Debug, Default)]
pub struct MemoryNotificationStore {
    notifications: Mutex<Vec<NewNotification>>,
}

impl MemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<NewNotification> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.notifications.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn insert(&self, notification: &NewNotification) -> Result<(), StoreError> {
        self.notifications.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(
        user_id: Uuid,
        vendor_id: Uuid,
        kind: AlertKind,
        inside: bool,
        notified: bool,
    ) -> StateChange {
        StateChange {
            user_id,
            vendor_id,
            kind,
            inside_radius: inside,
            notified_at: notified.then(Utc::now),
        }
    }

    #[tokio::test]
    async fn test_absent_record_reads_outside() {
        let store = MemoryProximityState::new();
        let inside = store
            .was_inside(Uuid::new_v4(), Uuid::new_v4(), AlertKind::DistanceBased)
            .await
            .unwrap();
        assert!(!inside);
    }

    #[tokio::test]
    async fn test_upsert_then_lookup() {
        let store = MemoryProximityState::new();
        let (user, vendor) = (Uuid::new_v4(), Uuid::new_v4());

        store
            .bulk_upsert(&[change(user, vendor, AlertKind::DistanceBased, true, true)])
            .await
            .unwrap();

        assert!(store
            .was_inside(user, vendor, AlertKind::DistanceBased)
            .await
            .unwrap());
        // Kind-tagged: the favorite-vendor edge is untouched.
        assert!(!store
            .was_inside(user, vendor, AlertKind::FavoriteVendor)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_exit_preserves_last_notified_at() {
        let store = MemoryProximityState::new();
        let (user, vendor) = (Uuid::new_v4(), Uuid::new_v4());

        store
            .bulk_upsert(&[change(user, vendor, AlertKind::DistanceBased, true, true)])
            .await
            .unwrap();
        let notified = store.last_notified_at(user, vendor, AlertKind::DistanceBased);
        assert!(notified.is_some());

        store
            .bulk_upsert(&[change(user, vendor, AlertKind::DistanceBased, false, false)])
            .await
            .unwrap();
        assert!(!store
            .was_inside(user, vendor, AlertKind::DistanceBased)
            .await
            .unwrap());
        assert_eq!(
            store.last_notified_at(user, vendor, AlertKind::DistanceBased),
            notified
        );
    }

    #[tokio::test]
    async fn test_bulk_lookup_omits_unknown_users() {
        let store = MemoryProximityState::new();
        let vendor = Uuid::new_v4();
        let known = Uuid::new_v4();
        let unknown = Uuid::new_v4();

        store
            .bulk_upsert(&[change(known, vendor, AlertKind::DistanceBased, true, true)])
            .await
            .unwrap();

        let map = store
            .bulk_lookup(vendor, AlertKind::DistanceBased, &[known, unknown])
            .await
            .unwrap();
        assert_eq!(map.get(&known), Some(&true));
        assert!(!map.contains_key(&unknown));
    }

    #[tokio::test]
    async fn test_memory_notification_store() {
        let store = MemoryNotificationStore::new();
        let n = NewNotification {
            user_id: Uuid::new_v4(),
            vendor_id: None,
            kind: AlertKind::NewVendorNearby,
            title: "t".into(),
            body: "b".into(),
            image: None,
            data: serde_json::json!({}),
        };
        store.insert(&n).await.unwrap();
        assert_eq!(store.count(), 1);
        assert_eq!(store.all()[0].title, "t");
    }
}
