//! Subscriber models.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Position;

/// A user as seen by the evaluator: identity, last known position and
/// registered push tokens. Repositories only hand the engine subscribers
/// whose relevant alert preference is enabled; a subscriber with no position
/// is skipped during evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscriber {
    pub user_id: Uuid,
    pub position: Option<Position>,
    pub device_tokens: Vec<String>,
}

impl Subscriber {
    /// Device tokens with empty entries filtered out.
    pub fn usable_tokens(&self) -> Vec<String> {
        self.device_tokens
            .iter()
            .filter(|t| !t.is_empty())
            .cloned()
            .collect()
    }
}

/// Full account view of a subscriber, used by the on-demand triggers to
/// check preferences before evaluating.
#[derive(Debug, Clone)]
pub struct SubscriberAccount {
    pub user_id: Uuid,
    pub position: Option<Position>,
    pub device_tokens: Vec<String>,
    pub distance_based_alert: bool,
    pub favorite_vendor_alert: bool,
    pub new_vendor_alert: bool,
}

impl SubscriberAccount {
    /// Whether the preference for the given kind is enabled.
    pub fn has_alert_enabled(&self, kind: super::AlertKind) -> bool {
        match kind {
            super::AlertKind::DistanceBased => self.distance_based_alert,
            super::AlertKind::FavoriteVendor => self.favorite_vendor_alert,
            super::AlertKind::NewVendorNearby => self.new_vendor_alert,
        }
    }

    /// Reduce to the evaluator-facing subscriber view.
    pub fn as_subscriber(&self) -> Subscriber {
        Subscriber {
            user_id: self.user_id,
            position: self.position,
            device_tokens: self.device_tokens.clone(),
        }
    }
}
