//! Vendor live-location poll job.
//!
//! Each cycle samples live vendor positions, drops vendors that have not
//! moved past the jitter threshold since their last evaluated sample, and
//! runs the alerting core for each remaining vendor against the
//! distance-based and favorite-vendor populations.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use uuid::Uuid;

use domain::geo;
use domain::models::{AlertKind, Position, VendorTarget};
use domain::services::{FavoriteIndex, LiveLocationSource, SubscriberDirectory, VendorDirectory};

use crate::config::ProximityConfig;
use crate::jobs::scheduler::{Job, JobFrequency};
use crate::services::proximity::ProximityEngine;

/// Last polled position per vendor, instance-local.
///
/// A restart forgets the samples, so the first cycle after boot evaluates
/// every live vendor once. That re-evaluation is silent for pairs whose
/// stored state already matches.
pub struct MoveSampleStore {
    threshold_m: f64,
    samples: Mutex<HashMap<Uuid, Position>>,
}

impl MoveSampleStore {
    pub fn new(threshold_m: f64) -> Self {
        Self {
            threshold_m,
            samples: Mutex::new(HashMap::new()),
        }
    }

    /// Record the sample and report whether it warrants re-evaluation:
    /// true for unseen vendors and for moves of at least the threshold.
    ///
    /// The sample is overwritten every cycle, so each move is measured
    /// against the previous poll rather than the last evaluated position.
    /// A vendor drifting below the threshold each cycle is never
    /// re-evaluated, however far it ends up from where it started.
    pub fn record_and_check(&self, vendor_id: Uuid, position: Position) -> bool {
        let mut samples = self.samples.lock().unwrap_or_else(|e| e.into_inner());
        match samples.insert(vendor_id, position) {
            Some(last) => geo::distance_meters(last, position) >= self.threshold_m,
            None => true,
        }
    }

    pub fn tracked_count(&self) -> usize {
        self.samples
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

pub struct VendorPollJob {
    source: Arc<dyn LiveLocationSource>,
    engine: ProximityEngine,
    subscribers: Arc<dyn SubscriberDirectory>,
    favorites: Arc<dyn FavoriteIndex>,
    vendors: Arc<dyn VendorDirectory>,
    samples: MoveSampleStore,
    interval_ms: u64,
}

impl VendorPollJob {
    pub fn new(
        source: Arc<dyn LiveLocationSource>,
        engine: ProximityEngine,
        subscribers: Arc<dyn SubscriberDirectory>,
        favorites: Arc<dyn FavoriteIndex>,
        vendors: Arc<dyn VendorDirectory>,
        config: &ProximityConfig,
    ) -> Self {
        Self {
            source,
            engine,
            subscribers,
            favorites,
            vendors,
            samples: MoveSampleStore::new(config.vendor_move_threshold_meters),
            interval_ms: config.poll_interval_ms,
        }
    }

    /// Evaluate one moved vendor against both polled populations.
    async fn evaluate_vendor(&self, target: &VendorTarget) -> Result<(), String> {
        let distance_population = self
            .subscribers
            .distance_alert_subscribers()
            .await
            .map_err(|e| format!("distance population query failed: {}", e))?;
        self.engine
            .evaluate_target(target, AlertKind::DistanceBased, &distance_population)
            .await
            .map_err(|e| format!("distance evaluation failed: {}", e))?;

        let favoriter_ids = self
            .favorites
            .user_ids_for_vendor(target.vendor_id)
            .await
            .map_err(|e| format!("favoriters query failed: {}", e))?;
        if !favoriter_ids.is_empty() {
            let favorite_population = self
                .subscribers
                .favorite_alert_subscribers(&favoriter_ids)
                .await
                .map_err(|e| format!("favorite population query failed: {}", e))?;
            self.engine
                .evaluate_target(target, AlertKind::FavoriteVendor, &favorite_population)
                .await
                .map_err(|e| format!("favorite evaluation failed: {}", e))?;
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl Job for VendorPollJob {
    fn name(&self) -> &'static str {
        "vendor_poll"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Millis(self.interval_ms)
    }

    async fn execute(&self) -> Result<(), String> {
        let snapshot = self.source.current_vendor_positions().await;
        metrics::gauge!("vendor_poll_live_vendors").set(snapshot.len() as f64);

        let moved: Vec<_> = snapshot
            .into_iter()
            .filter(|live| self.samples.record_and_check(live.vendor_id, live.position))
            .collect();

        if moved.is_empty() {
            return Ok(());
        }

        let vendor_ids: Vec<Uuid> = moved.iter().map(|v| v.vendor_id).collect();
        let names = self
            .vendors
            .names_by_ids(&vendor_ids)
            .await
            .map_err(|e| format!("vendor name query failed: {}", e))?;

        let mut failures = 0usize;
        for live in &moved {
            let target = VendorTarget {
                vendor_id: live.vendor_id,
                name: names.get(&live.vendor_id).cloned(),
                position: live.position,
            };

            // One bad vendor never blocks the rest of the cycle
            if let Err(e) = self.evaluate_vendor(&target).await {
                failures += 1;
                tracing::error!(vendor_id = %live.vendor_id, error = %e, "Vendor evaluation failed");
            }
        }

        metrics::counter!("vendor_poll_evaluated_total").increment((moved.len() - failures) as u64);

        if failures == moved.len() {
            return Err(format!("all {} vendor evaluations failed", failures));
        }

        tracing::debug!(
            evaluated = moved.len() - failures,
            failed = failures,
            "Vendor poll cycle done"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use domain::models::SubscriberAccount;
    use domain::services::{
        MemoryFavoriteIndex, MemoryNotificationStore, MemoryProximityState,
        MemorySubscriberDirectory, MemoryVendorDirectory, MockPushSender, StaticLocationSource,
    };

    use crate::services::proximity::ProximityEngine;
    use crate::services::sink::NotificationSink;

    fn pos(lat: f64, lng: f64) -> Position {
        Position::new(lat, lng).unwrap()
    }

    struct Fixture {
        source: Arc<StaticLocationSource>,
        subscribers: Arc<MemorySubscriberDirectory>,
        favorites: Arc<MemoryFavoriteIndex>,
        vendors: Arc<MemoryVendorDirectory>,
        notifications: Arc<MemoryNotificationStore>,
        job: VendorPollJob,
    }

    fn fixture() -> Fixture {
        let source = Arc::new(StaticLocationSource::new());
        let subscribers = Arc::new(MemorySubscriberDirectory::new());
        let favorites = Arc::new(MemoryFavoriteIndex::new());
        let vendors = Arc::new(MemoryVendorDirectory::new());
        let notifications = Arc::new(MemoryNotificationStore::new());

        let sink = NotificationSink::new(
            Arc::clone(&notifications) as _,
            Arc::new(MockPushSender::new()),
        );
        let engine = ProximityEngine::new(Arc::new(MemoryProximityState::new()), sink, 5.0);

        let config = ProximityConfig {
            alert_radius_km: 5.0,
            poll_interval_ms: 1_000,
            vendor_move_threshold_meters: 50.0,
            poll_enabled: true,
        };
        let job = VendorPollJob::new(
            Arc::clone(&source) as _,
            engine,
            Arc::clone(&subscribers) as _,
            Arc::clone(&favorites) as _,
            Arc::clone(&vendors) as _,
            &config,
        );

        Fixture {
            source,
            subscribers,
            favorites,
            vendors,
            notifications,
            job,
        }
    }

    fn account_at(lat: f64, lng: f64) -> SubscriberAccount {
        SubscriberAccount {
            user_id: Uuid::new_v4(),
            position: Position::new(lat, lng),
            device_tokens: vec!["tok".into()],
            distance_based_alert: true,
            favorite_vendor_alert: true,
            new_vendor_alert: false,
        }
    }

    #[tokio::test]
    async fn test_cycle_notifies_nearby_subscriber() {
        let f = fixture();
        let vendor = Uuid::new_v4();
        f.source.set_vendor(vendor, pos(0.0, 0.0));
        f.vendors.set_name(vendor, "Kebab King");
        f.subscribers.insert(account_at(0.0, 0.01));

        f.job.execute().await.unwrap();

        assert_eq!(f.notifications.count(), 1);
        let n = &f.notifications.all()[0];
        assert_eq!(n.vendor_id, Some(vendor));
        assert_eq!(n.kind, AlertKind::DistanceBased);
        assert!(n.body.contains("Kebab King"));
    }

    #[tokio::test]
    async fn test_unmoved_vendor_skipped_on_next_cycle() {
        let f = fixture();
        let vendor = Uuid::new_v4();
        f.source.set_vendor(vendor, pos(0.0, 0.0));
        f.subscribers.insert(account_at(0.0, 0.01));

        f.job.execute().await.unwrap();
        let after_first = f.notifications.count();

        // Same position: filtered by the move threshold, nothing re-runs
        f.job.execute().await.unwrap();
        assert_eq!(f.notifications.count(), after_first);
    }

    #[tokio::test]
    async fn test_favoriter_gets_favorite_alert_too() {
        let f = fixture();
        let vendor = Uuid::new_v4();
        let account = account_at(0.0, 0.01);
        let user = account.user_id;
        f.source.set_vendor(vendor, pos(0.0, 0.0));
        f.subscribers.insert(account);
        f.favorites.add(user, vendor);

        f.job.execute().await.unwrap();

        let kinds: Vec<AlertKind> = f.notifications.all().iter().map(|n| n.kind).collect();
        assert!(kinds.contains(&AlertKind::DistanceBased));
        assert!(kinds.contains(&AlertKind::FavoriteVendor));
    }

    #[test]
    fn test_unseen_vendor_passes() {
        let store = MoveSampleStore::new(50.0);
        assert!(store.record_and_check(Uuid::new_v4(), pos(10.0, 10.0)));
    }

    #[test]
    fn test_small_move_is_filtered() {
        let store = MoveSampleStore::new(50.0);
        let vendor = Uuid::new_v4();
        assert!(store.record_and_check(vendor, pos(10.0, 10.0)));
        // ~11 m north, under the 50 m threshold
        assert!(!store.record_and_check(vendor, pos(10.0001, 10.0)));
        assert!(!store.record_and_check(vendor, pos(10.0002, 10.0)));
    }

    #[test]
    fn test_sub_threshold_drift_never_triggers() {
        let store = MoveSampleStore::new(50.0);
        let vendor = Uuid::new_v4();
        assert!(store.record_and_check(vendor, pos(10.0, 10.0)));
        // Five ~33 m steps north: each cycle compares against the previous
        // poll's sample, so cumulative drift alone never re-evaluates even
        // though the vendor ends up ~167 m from where it started.
        for i in 1..=5 {
            let lat = 10.0 + 0.0003 * f64::from(i);
            assert!(!store.record_and_check(vendor, pos(lat, 10.0)));
        }
    }

    #[test]
    fn test_large_move_passes() {
        let store = MoveSampleStore::new(50.0);
        let vendor = Uuid::new_v4();
        assert!(store.record_and_check(vendor, pos(10.0, 10.0)));
        // ~111 m north
        assert!(store.record_and_check(vendor, pos(10.001, 10.0)));
        assert_eq!(store.tracked_count(), 1);
    }

    #[test]
    fn test_vendors_tracked_independently() {
        let store = MoveSampleStore::new(50.0);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert!(store.record_and_check(a, pos(10.0, 10.0)));
        assert!(store.record_and_check(b, pos(10.0, 10.0)));
        assert_eq!(store.tracked_count(), 2);
    }
}
