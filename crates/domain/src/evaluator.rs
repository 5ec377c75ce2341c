//! Transition evaluator: edge-triggered enter/exit detection.
//!
//! Pure decision logic. Given one vendor target, a candidate subscriber set
//! and the previously stored inside/outside state, it emits transitions and
//! nothing else; persisting state and dispatching notifications is the
//! caller's job.

use std::collections::HashMap;

use uuid::Uuid;

use crate::geo;
use crate::models::{AlertKind, Subscriber, VendorTarget};

/// Direction of a radius crossing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransitionDirection {
    /// Crossed from outside to inside. Carries the full-precision distance;
    /// round via [`geo::display_km`] before showing it to anyone.
    Enter { distance_km: f64 },
    /// Crossed from inside to outside. Re-arms the alert, never notifies.
    Exit,
}

/// A detected radius crossing for one (subscriber, target, kind).
#[derive(Debug, Clone)]
pub struct Transition {
    pub user_id: Uuid,
    pub vendor_id: Uuid,
    pub kind: AlertKind,
    pub direction: TransitionDirection,
}

impl Transition {
    pub fn is_enter(&self) -> bool {
        matches!(self.direction, TransitionDirection::Enter { .. })
    }
}

/// Evaluate one target against a subscriber set.
///
/// For each subscriber with a known position:
/// - `d <= radius_km` and previously outside emits an ENTER,
/// - `d > radius_km` and previously inside emits an EXIT,
/// - no state change emits nothing (and the caller writes nothing).
///
/// `was_inside` holds the stored state per subscriber; absence means
/// outside. Subscribers without a position are skipped entirely, creating
/// no state. The boundary `d == radius_km` counts as inside, and the
/// comparison uses full precision.
pub fn evaluate_transitions(
    target: &VendorTarget,
    kind: AlertKind,
    subscribers: &[Subscriber],
    was_inside: &HashMap<Uuid, bool>,
    radius_km: f64,
) -> Vec<Transition> {
    let mut transitions = Vec::new();

    for subscriber in subscribers {
        let Some(position) = subscriber.position else {
            continue;
        };

        let distance_km = geo::distance_km(position, target.position);
        let inside_now = distance_km <= radius_km;
        let inside_before = was_inside
            .get(&subscriber.user_id)
            .copied()
            .unwrap_or(false);

        if inside_now == inside_before {
            continue;
        }

        let direction = if inside_now {
            TransitionDirection::Enter { distance_km }
        } else {
            TransitionDirection::Exit
        };

        transitions.push(Transition {
            user_id: subscriber.user_id,
            vendor_id: target.vendor_id,
            kind,
            direction,
        });
    }

    transitions
}
