use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use domain::services::{
    LiveLocationSource, PushOutcome, PushSender, StaticLocationSource,
};
use persistence::repositories::{
    FavoriteRepository, NotificationRepository, ProximityStateRepository, SubscriberRepository,
    VendorRepository,
};
use proximity_engine::config::Config;
use proximity_engine::jobs::{JobScheduler, PoolMetricsJob, VendorPollJob};
use proximity_engine::logging;
use proximity_engine::services::{FcmPushSender, FirebaseRtdbSource, NotificationSink, ProximityEngine};

/// Stand-in sender for local runs without FCM credentials: pushes are
/// logged, never delivered. Notification rows are still written.
struct LogOnlyPushSender;

#[async_trait::async_trait]
impl PushSender for LogOnlyPushSender {
    async fn send_alert(
        &self,
        device_token: &str,
        title: &str,
        body: &str,
        _data: &HashMap<String, String>,
    ) -> PushOutcome {
        info!(device_token = %device_token, title = %title, body = %body, "Push (log only)");
        PushOutcome::Sent
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::load()?;

    logging::init_logging(&config.logging);

    info!("Starting proximity engine v{}", env!("CARGO_PKG_VERSION"));

    if config.metrics.enabled {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(([0, 0, 0, 0], config.metrics.port))
            .install()?;
        info!(port = config.metrics.port, "Prometheus exporter listening");
    }

    let pool = persistence::db::create_pool(&config.database).await?;

    info!("Running database migrations...");
    sqlx::migrate!("../persistence/src/migrations")
        .run(&pool)
        .await?;
    info!("Migrations completed");

    let push: Arc<dyn PushSender> = if config.fcm.enabled {
        Arc::new(FcmPushSender::new(config.fcm.clone())?)
    } else {
        warn!("FCM disabled, pushes will be logged only");
        Arc::new(LogOnlyPushSender)
    };

    let source: Arc<dyn LiveLocationSource> = if config.rtdb.enabled {
        Arc::new(FirebaseRtdbSource::new(config.rtdb.clone())?)
    } else {
        warn!("RTDB disabled, using an empty live-location source");
        Arc::new(StaticLocationSource::new())
    };

    let sink = NotificationSink::new(Arc::new(NotificationRepository::new(pool.clone())), push);
    let engine = ProximityEngine::new(
        Arc::new(ProximityStateRepository::new(pool.clone())),
        sink,
        config.proximity.alert_radius_km,
    );

    let mut scheduler = JobScheduler::new();
    if config.metrics.enabled {
        scheduler.register(PoolMetricsJob::new(pool.clone()));
    }
    if config.proximity.poll_enabled {
        scheduler.register(VendorPollJob::new(
            source,
            engine,
            Arc::new(SubscriberRepository::new(pool.clone())),
            Arc::new(FavoriteRepository::new(pool.clone())),
            Arc::new(VendorRepository::new(pool.clone())),
            &config.proximity,
        ));
    } else {
        warn!("Vendor poll job disabled by configuration");
    }
    scheduler.start();

    info!(
        radius_km = config.proximity.alert_radius_km,
        poll_interval_ms = config.proximity.poll_interval_ms,
        "Engine running, press Ctrl+C to stop"
    );
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received");
    scheduler.shutdown();
    scheduler.wait_for_shutdown(Duration::from_secs(30)).await;

    Ok(())
}
