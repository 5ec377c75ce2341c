//! Database row mappings.

mod subscriber;

pub use subscriber::{SubscriberAccountEntity, SubscriberEntity};
