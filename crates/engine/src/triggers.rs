//! On-demand evaluation triggers.
//!
//! The poll job covers vendors drifting around; these entry points cover the
//! discrete events that should not wait for the next tick: a subscriber
//! turning an alert on, a vendor pushing a fresh position, a vendor passing
//! verification, and manual favorite broadcasts.
//!
//! Entry points are fire-and-forget: failures are logged here and the unit of
//! work retries at the next natural trigger, so callers never see an error.

use std::sync::Arc;

use uuid::Uuid;

use domain::geo;
use domain::models::{alert_copy, AlertKind, BroadcastRequest, NewNotification, Position, VendorTarget};
use domain::services::{FavoriteIndex, LiveLocationSource, SubscriberDirectory, VendorDirectory};

use crate::error::EngineError;
use crate::services::proximity::ProximityEngine;
use crate::services::sink::NotificationSink;

#[derive(Clone)]
pub struct OnDemandTriggers {
    source: Arc<dyn LiveLocationSource>,
    engine: ProximityEngine,
    sink: NotificationSink,
    subscribers: Arc<dyn SubscriberDirectory>,
    favorites: Arc<dyn FavoriteIndex>,
    vendors: Arc<dyn VendorDirectory>,
}

impl OnDemandTriggers {
    pub fn new(
        source: Arc<dyn LiveLocationSource>,
        engine: ProximityEngine,
        sink: NotificationSink,
        subscribers: Arc<dyn SubscriberDirectory>,
        favorites: Arc<dyn FavoriteIndex>,
        vendors: Arc<dyn VendorDirectory>,
    ) -> Self {
        Self {
            source,
            engine,
            sink,
            subscribers,
            favorites,
            vendors,
        }
    }

    /// A subscriber enabled an alert preference: evaluate them immediately
    /// against the relevant vendors so a vendor already in range alerts now
    /// instead of on that vendor's next move.
    pub async fn subscriber_preference_enabled(&self, user_id: Uuid, kind: AlertKind) {
        if let Err(e) = self.preference_enabled_inner(user_id, kind).await {
            tracing::error!(error = %e, user_id = %user_id, kind = %kind, "Preference trigger failed");
        }
    }

    async fn preference_enabled_inner(
        &self,
        user_id: Uuid,
        kind: AlertKind,
    ) -> Result<(), EngineError> {
        let Some(account) = self.subscribers.account(user_id).await? else {
            tracing::warn!(user_id = %user_id, "Preference trigger for unknown user");
            return Ok(());
        };
        if !account.has_alert_enabled(kind) {
            return Ok(());
        }

        // Prefer the live position; fall back to the stored one
        let mut subscriber = account.as_subscriber();
        if let Some(live) = self.source.current_user_position(user_id).await {
            subscriber.position = Some(live);
        }
        if subscriber.position.is_none() {
            tracing::debug!(user_id = %user_id, "Preference trigger with no known position");
            return Ok(());
        }

        let live_vendors = self.source.current_vendor_positions().await;
        let candidates: Vec<_> = match kind {
            AlertKind::FavoriteVendor => {
                let favorited = self.favorites.vendor_ids_for_user(user_id).await?;
                live_vendors
                    .into_iter()
                    .filter(|v| favorited.contains(&v.vendor_id))
                    .collect()
            }
            _ => live_vendors,
        };
        if candidates.is_empty() {
            return Ok(());
        }

        let vendor_ids: Vec<Uuid> = candidates.iter().map(|v| v.vendor_id).collect();
        let names = self.vendors.names_by_ids(&vendor_ids).await?;

        let population = std::slice::from_ref(&subscriber);
        for live in &candidates {
            let target = VendorTarget {
                vendor_id: live.vendor_id,
                name: names.get(&live.vendor_id).cloned(),
                position: live.position,
            };
            self.engine.evaluate_target(&target, kind, population).await?;
        }

        Ok(())
    }

    /// A vendor reported a fresh position outside the poll cycle. Missing
    /// coordinates fall back to the vendor's registered stall position.
    pub async fn vendor_position_updated(&self, vendor_id: Uuid, lat: Option<f64>, lng: Option<f64>) {
        if let Err(e) = self.position_updated_inner(vendor_id, lat, lng).await {
            tracing::error!(error = %e, vendor_id = %vendor_id, "Position update trigger failed");
        }
    }

    async fn position_updated_inner(
        &self,
        vendor_id: Uuid,
        lat: Option<f64>,
        lng: Option<f64>,
    ) -> Result<(), EngineError> {
        let Some(target) = self.resolve_target(vendor_id, lat, lng).await? else {
            tracing::warn!(vendor_id = %vendor_id, "Position update with no usable coordinates");
            return Ok(());
        };

        let distance_population = self.subscribers.distance_alert_subscribers().await?;
        self.engine
            .evaluate_target(&target, AlertKind::DistanceBased, &distance_population)
            .await?;

        let favoriter_ids = self.favorites.user_ids_for_vendor(vendor_id).await?;
        if !favoriter_ids.is_empty() {
            let favorite_population = self
                .subscribers
                .favorite_alert_subscribers(&favoriter_ids)
                .await?;
            self.engine
                .evaluate_target(&target, AlertKind::FavoriteVendor, &favorite_population)
                .await?;
        }

        Ok(())
    }

    /// A vendor just passed verification: one-shot blast to every opted-in
    /// subscriber already within the radius. No pair state is involved;
    /// verification happens once per vendor.
    pub async fn vendor_verified(&self, vendor_id: Uuid, lat: Option<f64>, lng: Option<f64>) {
        if let Err(e) = self.vendor_verified_inner(vendor_id, lat, lng).await {
            tracing::error!(error = %e, vendor_id = %vendor_id, "Verified-vendor trigger failed");
        }
    }

    async fn vendor_verified_inner(
        &self,
        vendor_id: Uuid,
        lat: Option<f64>,
        lng: Option<f64>,
    ) -> Result<(), EngineError> {
        let Some(target) = self.resolve_target(vendor_id, lat, lng).await? else {
            tracing::warn!(vendor_id = %vendor_id, "Verified vendor has no known position");
            return Ok(());
        };

        let radius_km = self.engine.radius_km();
        let population = self.subscribers.new_vendor_alert_subscribers().await?;

        let mut notified = 0usize;
        for subscriber in &population {
            let Some(position) = subscriber.position else {
                continue;
            };
            let distance_km = geo::distance_km(position, target.position);
            if distance_km > radius_km {
                continue;
            }

            let copy = alert_copy(
                AlertKind::NewVendorNearby,
                Some(target.display_name()),
                radius_km,
            );
            let notification = NewNotification {
                user_id: subscriber.user_id,
                vendor_id: Some(vendor_id),
                kind: AlertKind::NewVendorNearby,
                title: copy.title,
                body: copy.body,
                image: None,
                data: serde_json::json!({
                    "vendorId": vendor_id,
                    "type": AlertKind::NewVendorNearby.as_str(),
                    "distanceKm": geo::display_km(distance_km),
                }),
            };
            self.sink
                .deliver(&notification, &subscriber.usable_tokens())
                .await?;
            notified += 1;
        }

        tracing::info!(vendor_id = %vendor_id, notified, "New-vendor blast done");
        Ok(())
    }

    /// Manual broadcast to everyone who favorited a vendor and keeps the
    /// favorite alert on. Pure fan-out, no radius and no pair state.
    /// Returns how many recipients got a persisted notification.
    pub async fn broadcast_to_favorites(&self, vendor_id: Uuid, request: &BroadcastRequest) -> usize {
        match self.broadcast_inner(vendor_id, request).await {
            Ok(delivered) => delivered,
            Err(e) => {
                tracing::error!(error = %e, vendor_id = %vendor_id, "Favorite broadcast failed");
                0
            }
        }
    }

    async fn broadcast_inner(
        &self,
        vendor_id: Uuid,
        request: &BroadcastRequest,
    ) -> Result<usize, EngineError> {
        validator::Validate::validate(request)?;

        let favoriter_ids = self.favorites.user_ids_for_vendor(vendor_id).await?;
        if favoriter_ids.is_empty() {
            return Ok(0);
        }

        let recipients = self
            .subscribers
            .favorite_alert_recipients(&favoriter_ids)
            .await?;

        let mut delivered = 0usize;
        for recipient in &recipients {
            let notification = NewNotification {
                user_id: recipient.user_id,
                vendor_id: Some(vendor_id),
                kind: AlertKind::FavoriteVendor,
                title: request.title.clone(),
                body: request.body.clone(),
                image: request.image.clone(),
                data: request.data.clone(),
            };

            match self
                .sink
                .deliver(&notification, &recipient.usable_tokens())
                .await
            {
                Ok(_) => delivered += 1,
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        user_id = %recipient.user_id,
                        vendor_id = %vendor_id,
                        "Broadcast delivery failed"
                    );
                }
            }
        }

        tracing::info!(
            vendor_id = %vendor_id,
            recipients = recipients.len(),
            delivered,
            "Favorite broadcast done"
        );
        Ok(delivered)
    }

    /// Target from explicit coordinates, falling back to the registered
    /// fixed location, with the display name attached.
    async fn resolve_target(
        &self,
        vendor_id: Uuid,
        lat: Option<f64>,
        lng: Option<f64>,
    ) -> Result<Option<VendorTarget>, EngineError> {
        let position = match Position::from_parts(lat, lng) {
            Some(p) => Some(p),
            None => self.vendors.fixed_position(vendor_id).await?,
        };
        let Some(position) = position else {
            return Ok(None);
        };

        let names = self.vendors.names_by_ids(&[vendor_id]).await?;
        Ok(Some(VendorTarget {
            vendor_id,
            name: names.get(&vendor_id).cloned(),
            position,
        }))
    }
}
