//! Subscriber entities (database row mappings).

use sqlx::FromRow;
use uuid::Uuid;

use domain::models::{Position, Subscriber, SubscriberAccount};

/// Evaluation-facing projection of the users table.
#[derive(Debug, Clone, FromRow)]
pub struct SubscriberEntity {
    pub id: Uuid,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub fcm_device_tokens: Vec<String>,
}

impl From<SubscriberEntity> for Subscriber {
    fn from(entity: SubscriberEntity) -> Self {
        Self {
            user_id: entity.id,
            position: Position::from_parts(entity.lat, entity.lng),
            device_tokens: entity.fcm_device_tokens,
        }
    }
}

/// Account projection including the alert preference flags.
#[derive(Debug, Clone, FromRow)]
pub struct SubscriberAccountEntity {
    pub id: Uuid,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub fcm_device_tokens: Vec<String>,
    pub distance_based_alert: bool,
    pub favorite_vendor_alert: bool,
    pub new_vendor_alert: bool,
}

impl From<SubscriberAccountEntity> for SubscriberAccount {
    fn from(entity: SubscriberAccountEntity) -> Self {
        Self {
            user_id: entity.id,
            position: Position::from_parts(entity.lat, entity.lng),
            device_tokens: entity.fcm_device_tokens,
            distance_based_alert: entity.distance_based_alert,
            favorite_vendor_alert: entity.favorite_vendor_alert,
            new_vendor_alert: entity.new_vendor_alert,
        }
    }
}
