//! Repository implementations.

mod favorite;
mod notification;
mod proximity_state;
mod subscriber;
mod vendor;

pub use favorite::FavoriteRepository;
pub use notification::NotificationRepository;
pub use proximity_state::ProximityStateRepository;
pub use subscriber::SubscriberRepository;
pub use vendor::VendorRepository;

use domain::services::StoreError;

/// Map a database error into the engine-facing store error.
pub(crate) fn store_err(err: sqlx::Error) -> StoreError {
    StoreError(err.to_string())
}
