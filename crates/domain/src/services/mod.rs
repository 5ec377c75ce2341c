//! Service traits at the engine's I/O seams.

pub mod directory;
pub mod live_location;
pub mod push;
pub mod stores;

pub use directory::{
    FavoriteIndex, MemoryFavoriteIndex, MemorySubscriberDirectory, MemoryVendorDirectory,
    SubscriberDirectory, VendorDirectory,
};
pub use live_location::{LiveLocationSource, StaticLocationSource};
pub use push::{MockPushSender, PushOutcome, PushSender, SentPush};
pub use stores::{
    MemoryNotificationStore, MemoryProximityState, NotificationStore, ProximityStateStore,
    StateChange, StoreError,
};
