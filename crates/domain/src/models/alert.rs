//! Alert kinds and their notification copy.

use serde::{Deserialize, Serialize};

/// The kind of proximity alert a notification belongs to.
///
/// Kind is data, not control flow: the same evaluator runs for every kind,
/// and distance-based and favorite-vendor edges for the same (user, vendor)
/// pair are tracked independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    DistanceBased,
    FavoriteVendor,
    NewVendorNearby,
}

impl AlertKind {
    /// Database/payload string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DistanceBased => "distance_based",
            Self::FavoriteVendor => "favorite_vendor",
            Self::NewVendorNearby => "new_vendor_nearby",
        }
    }

    /// Parse from the string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "distance_based" => Some(Self::DistanceBased),
            "favorite_vendor" => Some(Self::FavoriteVendor),
            "new_vendor_nearby" => Some(Self::NewVendorNearby),
            _ => None,
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Title and body for a proximity notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertCopy {
    pub title: String,
    pub body: String,
}

/// Notification copy for an ENTER event of the given kind.
pub fn alert_copy(kind: AlertKind, vendor_name: Option<&str>, radius_km: f64) -> AlertCopy {
    let name = vendor_name.unwrap_or("A vendor");
    match kind {
        AlertKind::DistanceBased => AlertCopy {
            title: "Vendor nearby".to_string(),
            body: format!("{} is within {} km of you", name, radius_km),
        },
        AlertKind::FavoriteVendor => AlertCopy {
            title: "Favorite Vendor Update".to_string(),
            body: format!("Your favourite vendor {} is nearby, Go Check them out!", name),
        },
        AlertKind::NewVendorNearby => AlertCopy {
            title: "New vendor near you".to_string(),
            body: format!("{} is within {} km of you", name, radius_km),
        },
    }
}
