//! Engine services: push delivery, live locations, and the alerting core.

pub mod fcm;
pub mod google_auth;
pub mod proximity;
pub mod rtdb;
pub mod sink;

pub use fcm::{FcmError, FcmPushSender};
pub use google_auth::{GoogleAuthError, GoogleTokenProvider, ServiceAccountCredentials};
pub use proximity::{EvaluationReport, ProximityEngine};
pub use rtdb::FirebaseRtdbSource;
pub use sink::{DeliveryReport, NotificationSink};
