//! Live location feed abstraction.

use std::collections::HashMap;
use std::sync::Mutex;

use uuid::Uuid;

use crate::models::{Position, VendorLivePosition};

/// Read-only view of the external realtime location store.
///
/// Both operations are best-effort: a transient outage yields an empty
/// snapshot / `None`, never an error, so a poll cycle degrades to a no-op
/// instead of crashing. Malformed entries are discarded at this boundary.
#[async_trait::async_trait]
pub trait LiveLocationSource: Send + Sync {
    /// One snapshot of all vendor live positions. Finite, not restartable.
    async fn current_vendor_positions(&self) -> Vec<VendorLivePosition>;

    /// A single user's live position, if the store has one.
    async fn current_user_position(&self, user_id: Uuid) -> Option<Position>;
}

/// In-memory location source for development and tests.
#[derive(Debug, Default)]
pub struct StaticLocationSource {
    vendors: Mutex<Vec<VendorLivePosition>>,
    users: Mutex<HashMap<Uuid, Position>>,
}

impl StaticLocationSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_vendor(&self, vendor_id: Uuid, position: Position) {
        let mut vendors = self.vendors.lock().unwrap();
        vendors.retain(|v| v.vendor_id != vendor_id);
        vendors.push(VendorLivePosition {
            vendor_id,
            position,
        });
    }

    pub fn set_user(&self, user_id: Uuid, position: Position) {
        self.users.lock().unwrap().insert(user_id, position);
    }

    pub fn clear(&self) {
        self.vendors.lock().unwrap().clear();
        self.users.lock().unwrap().clear();
    }
}

#[async_trait::async_trait]
impl LiveLocationSource for StaticLocationSource {
    async fn current_vendor_positions(&self) -> Vec<VendorLivePosition> {
        self.vendors.lock().unwrap().clone()
    }

    async fn current_user_position(&self, user_id: Uuid) -> Option<Position> {
        self.users.lock().unwrap().get(&user_id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_source_snapshot() {
        let source = StaticLocationSource::new();
        let v1 = Uuid::new_v4();
        source.set_vendor(v1, Position::new(1.0, 2.0).unwrap());
        source.set_vendor(v1, Position::new(3.0, 4.0).unwrap());

        let snapshot = source.current_vendor_positions().await;
        assert_eq!(snapshot.len(), 1, "re-set replaces, not appends");
        assert_eq!(snapshot[0].position, Position::new(3.0, 4.0).unwrap());
    }

    #[tokio::test]
    async fn test_static_source_user_lookup() {
        let source = StaticLocationSource::new();
        let user = Uuid::new_v4();
        assert!(source.current_user_position(user).await.is_none());

        source.set_user(user, Position::new(5.0, 6.0).unwrap());
        assert_eq!(
            source.current_user_position(user).await,
            Position::new(5.0, 6.0)
        );
    }
}
