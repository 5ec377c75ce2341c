//! Proximity record: the persisted inside/outside edge state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AlertKind;

/// Persistent per-(user, vendor, kind) state used for edge detection.
///
/// At most one record exists per key; an absent record is equivalent to
/// `inside_radius = false`. Records are created lazily on the first
/// transition of a pair, updated on every transition afterwards, and only
/// deleted by cascade when the user or vendor is deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProximityRecord {
    pub user_id: Uuid,
    pub vendor_id: Uuid,
    pub kind: AlertKind,
    pub inside_radius: bool,
    pub last_notified_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}
