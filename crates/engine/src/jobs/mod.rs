//! Background jobs and their scheduler.

pub mod pool_metrics;
pub mod scheduler;
pub mod vendor_poll;

pub use pool_metrics::PoolMetricsJob;
pub use scheduler::{Job, JobFrequency, JobScheduler};
pub use vendor_poll::{MoveSampleStore, VendorPollJob};
