//! Notification delivery sink.
//!
//! Persists a notification row first, then fans pushes out to every device
//! token. Push failures are tolerated per token: one dead device never blocks
//! the others, and the persisted row survives regardless.

use std::sync::Arc;

use domain::models::NewNotification;
use domain::services::{NotificationStore, PushSender, StoreError};

#[derive(Clone)]
pub struct NotificationSink {
    store: Arc<dyn NotificationStore>,
    push: Arc<dyn PushSender>,
}

/// What happened to one notification across its recipient's devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub persisted: bool,
    pub attempted: usize,
    pub sent: usize,
    pub failed: usize,
}

impl NotificationSink {
    pub fn new(store: Arc<dyn NotificationStore>, push: Arc<dyn PushSender>) -> Self {
        Self { store, push }
    }

    /// Persist the notification, then push to each device token concurrently.
    pub async fn deliver(
        &self,
        notification: &NewNotification,
        device_tokens: &[String],
    ) -> Result<DeliveryReport, StoreError> {
        // The row is the source of truth for in-app history; it must land
        // before any push goes out.
        self.store.insert(notification).await?;

        if device_tokens.is_empty() {
            tracing::debug!(
                user_id = %notification.user_id,
                kind = %notification.kind,
                "Notification persisted, no device tokens to push to"
            );
            return Ok(DeliveryReport {
                persisted: true,
                attempted: 0,
                sent: 0,
                failed: 0,
            });
        }

        let title = notification.title.clone();
        let body = notification.body.clone();
        let data = notification.stringified_data();

        let mut handles = Vec::with_capacity(device_tokens.len());
        for token in device_tokens {
            let push = Arc::clone(&self.push);
            let token = token.clone();
            let title = title.clone();
            let body = body.clone();
            let data = data.clone();
            handles.push(tokio::spawn(async move {
                push.send_alert(&token, &title, &body, &data).await
            }));
        }

        let mut sent: usize = 0;
        let mut failed: usize = 0;
        for handle in handles {
            match handle.await {
                Ok(outcome) if outcome.is_sent() => sent += 1,
                Ok(outcome) => {
                    failed += 1;
                    tracing::warn!(
                        user_id = %notification.user_id,
                        outcome = ?outcome,
                        "Push attempt failed"
                    );
                }
                Err(e) => {
                    failed += 1;
                    tracing::error!(error = %e, "Push task panicked");
                }
            }
        }

        tracing::info!(
            user_id = %notification.user_id,
            kind = %notification.kind,
            attempted = device_tokens.len(),
            sent,
            failed,
            "Notification delivered"
        );

        metrics::counter!("notifications_persisted_total").increment(1);
        metrics::counter!("pushes_sent_total").increment(sent as u64);
        metrics::counter!("pushes_failed_total").increment(failed as u64);

        Ok(DeliveryReport {
            persisted: true,
            attempted: device_tokens.len(),
            sent,
            failed,
        })
    }
}
