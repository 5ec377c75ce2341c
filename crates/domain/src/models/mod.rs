//! Domain models for the proximity engine.

mod alert;
mod notification;
mod position;
mod proximity_record;
mod subscriber;
mod vendor;

pub use alert::{alert_copy, AlertCopy, AlertKind};
pub use notification::{BroadcastRequest, NewNotification};
pub use position::Position;
pub use proximity_record::ProximityRecord;
pub use subscriber::{Subscriber, SubscriberAccount};
pub use vendor::{VendorLivePosition, VendorTarget};
