//! The alerting core: radius evaluation against persisted pair state.
//!
//! One entry point, [`ProximityEngine::evaluate_target`], serves every
//! trigger: the vendor poll job, user/vendor position updates, preference
//! toggles, and the new-vendor blast all reduce to "evaluate this target
//! against this subscriber population under this kind".

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use domain::evaluator::{evaluate_transitions, TransitionDirection};
use domain::geo;
use domain::models::{alert_copy, AlertKind, NewNotification, Subscriber, VendorTarget};
use domain::services::{ProximityStateStore, StateChange, StoreError};

use crate::services::sink::NotificationSink;

#[derive(Clone)]
pub struct ProximityEngine {
    state: Arc<dyn ProximityStateStore>,
    sink: NotificationSink,
    radius_km: f64,
}

/// Summary of one target evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluationReport {
    pub enters: usize,
    pub exits: usize,
    pub pushes_attempted: usize,
    pub pushes_sent: usize,
}

impl ProximityEngine {
    pub fn new(
        state: Arc<dyn ProximityStateStore>,
        sink: NotificationSink,
        radius_km: f64,
    ) -> Self {
        Self {
            state,
            sink,
            radius_km,
        }
    }

    pub fn radius_km(&self) -> f64 {
        self.radius_km
    }

    /// Evaluate one vendor target against a subscriber population, persist
    /// the flipped edges, and notify every ENTER.
    ///
    /// State is written before pushes go out, so a re-run after a push
    /// failure stays silent rather than double-notifying.
    pub async fn evaluate_target(
        &self,
        target: &VendorTarget,
        kind: AlertKind,
        subscribers: &[Subscriber],
    ) -> Result<EvaluationReport, StoreError> {
        if subscribers.is_empty() {
            return Ok(EvaluationReport::default());
        }

        let user_ids: Vec<Uuid> = subscribers.iter().map(|s| s.user_id).collect();
        let was_inside = self
            .state
            .bulk_lookup(target.vendor_id, kind, &user_ids)
            .await?;

        let transitions =
            evaluate_transitions(target, kind, subscribers, &was_inside, self.radius_km);
        if transitions.is_empty() {
            return Ok(EvaluationReport::default());
        }

        let now = Utc::now();
        let changes: Vec<StateChange> = transitions
            .iter()
            .map(|t| StateChange {
                user_id: t.user_id,
                vendor_id: t.vendor_id,
                kind: t.kind,
                inside_radius: t.is_enter(),
                notified_at: t.is_enter().then_some(now),
            })
            .collect();
        self.state.bulk_upsert(&changes).await?;

        let by_user: HashMap<Uuid, &Subscriber> =
            subscribers.iter().map(|s| (s.user_id, s)).collect();

        let mut report = EvaluationReport::default();
        for transition in &transitions {
            let distance_km = match transition.direction {
                TransitionDirection::Enter { distance_km } => distance_km,
                TransitionDirection::Exit => {
                    report.exits += 1;
                    continue;
                }
            };
            report.enters += 1;

            let Some(subscriber) = by_user.get(&transition.user_id) else {
                continue;
            };

            let copy = alert_copy(kind, Some(target.display_name()), self.radius_km);
            let notification = NewNotification {
                user_id: transition.user_id,
                vendor_id: Some(target.vendor_id),
                kind,
                title: copy.title,
                body: copy.body,
                image: None,
                data: serde_json::json!({
                    "vendorId": target.vendor_id,
                    "type": kind.as_str(),
                    "distanceKm": geo::display_km(distance_km),
                }),
            };

            match self
                .sink
                .deliver(&notification, &subscriber.usable_tokens())
                .await
            {
                Ok(delivery) => {
                    report.pushes_attempted += delivery.attempted;
                    report.pushes_sent += delivery.sent;
                }
                Err(e) => {
                    // The edge is already persisted, so the alert is spent;
                    // the row loss is logged and accepted.
                    tracing::error!(
                        error = %e,
                        user_id = %transition.user_id,
                        vendor_id = %target.vendor_id,
                        "Failed to persist notification for ENTER"
                    );
                }
            }
        }

        if report.enters > 0 || report.exits > 0 {
            tracing::info!(
                vendor_id = %target.vendor_id,
                kind = %kind,
                enters = report.enters,
                exits = report.exits,
                "Proximity transitions processed"
            );
            metrics::counter!("proximity_enters_total").increment(report.enters as u64);
            metrics::counter!("proximity_exits_total").increment(report.exits as u64);
        }

        Ok(report)
    }
}
